//! Table rendering for human-facing list views
//!
//! A [`TableConvertor`] turns one object or a whole list into rows under a
//! fixed column schema. The store hands objects to the convertor through the
//! type-erased [`TableSource`], so [`TableConverter`] downcasts each object
//! explicitly and reports [`StoreError::TypeMismatch`] instead of panicking
//! when it is handed a foreign kind.

use crate::core::descriptor::GroupResource;
use crate::core::error::StoreError;
use crate::core::meta::{ListMeta, Object, ObjectList, Resource};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::marker::PhantomData;
use std::sync::Arc;

/// One column of a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumnDefinition {
    pub name: String,

    /// Value type: `string`, `integer`, `number`, `boolean` or `date`
    #[serde(rename = "type")]
    pub column_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// 0 for columns shown by default, higher for wide output only
    #[serde(default)]
    pub priority: i32,
}

impl TableColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            format: String::new(),
            description: String::new(),
            priority: 0,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// How much of each object to embed in its row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeObject {
    None,
    #[default]
    Metadata,
    Object,
}

#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    pub include_object: IncludeObject,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub metadata: ListMeta,
    pub column_definitions: Vec<TableColumnDefinition>,
    pub rows: Vec<TableRow>,
}

/// What to render: a single object or a list of objects
#[derive(Clone, Copy)]
pub enum TableSource<'a> {
    Object(&'a dyn Object),
    List(&'a dyn ObjectList),
}

/// Renders objects as table rows
pub trait TableConvertor: Send + Sync {
    fn column_definitions(&self) -> &[TableColumnDefinition];

    fn convert_to_table(
        &self,
        source: TableSource<'_>,
        options: &TableOptions,
    ) -> Result<Table, StoreError>;
}

/// Row function: one cell per column, in column order
pub type RowFn<T> = Arc<dyn Fn(&T) -> Result<Vec<Value>, StoreError> + Send + Sync>;

/// Render a timestamp as RFC 3339 in UTC with whole seconds, e.g. `2024-05-01T12:00:00Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A `date` cell; `null` when the timestamp is unset
pub fn timestamp_cell(ts: Option<&DateTime<Utc>>) -> Value {
    ts.map(|t| Value::String(format_timestamp(t)))
        .unwrap_or(Value::Null)
}

/// The `Name` + `Created At` schema used when a kind declares no columns
pub fn default_column_definitions() -> Vec<TableColumnDefinition> {
    vec![
        TableColumnDefinition::new("Name", "string").with_format("name"),
        TableColumnDefinition::new("Created At", "date"),
    ]
}

/// Table convertor for one resource kind
pub struct TableConverter<T> {
    resource: GroupResource,
    columns: Vec<TableColumnDefinition>,
    row: RowFn<T>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Resource> TableConverter<T> {
    /// Build a convertor from a column schema and a row function
    ///
    /// An empty `columns` falls back to [`default_column_definitions`] and the
    /// matching default row; `row` is then unused.
    pub fn new<F>(resource: GroupResource, columns: Vec<TableColumnDefinition>, row: F) -> Self
    where
        F: Fn(&T) -> Result<Vec<Value>, StoreError> + Send + Sync + 'static,
    {
        if columns.is_empty() {
            return Self::with_default_columns(resource);
        }
        Self {
            resource,
            columns,
            row: Arc::new(row),
            _kind: PhantomData,
        }
    }

    /// `Name` and `Created At` only
    pub fn with_default_columns(resource: GroupResource) -> Self {
        Self {
            resource,
            columns: default_column_definitions(),
            row: Arc::new(|obj: &T| {
                let meta = obj.metadata();
                Ok(vec![
                    json!(meta.name),
                    timestamp_cell(meta.creation_timestamp.as_ref()),
                ])
            }),
            _kind: PhantomData,
        }
    }

    fn downcast<'a>(&self, object: &'a dyn Object) -> Result<&'a T, StoreError> {
        object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| StoreError::TypeMismatch {
                resource: self.resource.to_string(),
                expected: std::any::type_name::<T>().to_string(),
                actual: object.type_name().to_string(),
            })
    }

    fn row_for(&self, object: &dyn Object, options: &TableOptions) -> Result<TableRow, StoreError> {
        let typed = self.downcast(object)?;
        let cells = (self.row)(typed)?;
        if cells.len() != self.columns.len() {
            return Err(StoreError::MalformedRow {
                resource: self.resource.to_string(),
                name: typed.metadata().name.clone(),
                expected: self.columns.len(),
                actual: cells.len(),
            });
        }

        let object = match options.include_object {
            IncludeObject::None => None,
            IncludeObject::Metadata => Some(json!({ "metadata": typed.metadata() })),
            IncludeObject::Object => Some(serde_json::to_value(typed)?),
        };

        Ok(TableRow { cells, object })
    }
}

impl<T: Resource> TableConvertor for TableConverter<T> {
    fn column_definitions(&self) -> &[TableColumnDefinition] {
        &self.columns
    }

    fn convert_to_table(
        &self,
        source: TableSource<'_>,
        options: &TableOptions,
    ) -> Result<Table, StoreError> {
        let mut table = Table {
            column_definitions: self.columns.clone(),
            ..Default::default()
        };

        match source {
            TableSource::Object(object) => {
                table.metadata.resource_version = object.object_meta().resource_version.clone();
                table.rows.push(self.row_for(object, options)?);
            }
            TableSource::List(list) => {
                table.metadata = list.list_meta().clone();
                table.rows = list
                    .objects()
                    .into_iter()
                    .map(|object| self.row_for(object, options))
                    .collect::<Result<Vec<_>, _>>()?;
            }
        }

        Ok(table)
    }
}
