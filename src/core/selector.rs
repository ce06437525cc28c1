//! Label and field selectors
//!
//! # Syntax
//!
//! Label selectors are comma-separated requirements:
//!
//! ```text
//! app=web                 equality (also `app==web`)
//! tier!=cache             inequality
//! env in (prod,staging)   set membership
//! env notin (dev)         set exclusion
//! canary                  key exists
//! !canary                 key does not exist
//! ```
//!
//! Field selectors accept only `=`, `==` and `!=`. A field absent from the
//! object's attributes never satisfies `=`, and always satisfies `!=`.

use crate::core::attributes::Attributes;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Selector parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("missing key in selector term '{0}'")]
    EmptyKey(String),

    #[error("invalid key '{0}' in selector")]
    InvalidKey(String),

    #[error("field selectors only support '=', '==' and '!=' (term '{0}')")]
    UnsupportedOperator(String),

    #[error("malformed value list in selector term '{0}'")]
    InvalidValueList(String),

    #[error("unbalanced parentheses in selector '{0}'")]
    Unbalanced(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// One term of a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: Operator,
    values: Vec<String>,
}

impl Requirement {
    pub fn new(key: impl Into<String>, operator: Operator, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            operator,
            values,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    fn matches(&self, set: &BTreeMap<String, String>) -> bool {
        let value = set.get(&self.key);
        match self.operator {
            Operator::Equals => value.is_some_and(|v| self.values.first() == Some(v)),
            Operator::NotEquals => value.is_none_or(|v| self.values.first() != Some(v)),
            Operator::In => value.is_some_and(|v| self.values.contains(v)),
            Operator::NotIn => value.is_none_or(|v| !self.values.contains(v)),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.values.first().map(String::as_str).unwrap_or("");
        match self.operator {
            Operator::Equals => write!(f, "{}={}", self.key, first),
            Operator::NotEquals => write!(f, "{}!={}", self.key, first),
            Operator::In => write!(f, "{} in ({})", self.key, self.values.join(",")),
            Operator::NotIn => write!(f, "{} notin ({})", self.key, self.values.join(",")),
            Operator::Exists => write!(f, "{}", self.key),
            Operator::DoesNotExist => write!(f, "!{}", self.key),
        }
    }
}

fn set_term_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\S+)\s+(in|notin)\s*\((.*)\)$").unwrap())
}

/// Split on commas that are not inside a `( … )` value list
fn split_terms(input: &str) -> Result<Vec<&str>, SelectorError> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SelectorError::Unbalanced(input.to_string()))?;
            }
            ',' if depth == 0 => {
                terms.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SelectorError::Unbalanced(input.to_string()));
    }
    terms.push(input[start..].trim());
    Ok(terms.into_iter().filter(|t| !t.is_empty()).collect())
}

fn check_key(key: &str, term: &str) -> Result<String, SelectorError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(SelectorError::EmptyKey(term.to_string()));
    }
    if key.chars().any(|c| c.is_whitespace() || "!=(),".contains(c)) {
        return Err(SelectorError::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}

fn parse_equality(term: &str) -> Option<(&str, Operator, &str)> {
    if let Some((key, value)) = term.split_once("!=") {
        return Some((key, Operator::NotEquals, value));
    }
    if let Some((key, value)) = term.split_once("==") {
        return Some((key, Operator::Equals, value));
    }
    term.split_once('=')
        .map(|(key, value)| (key, Operator::Equals, value))
}

fn parse_label_term(term: &str) -> Result<Requirement, SelectorError> {
    if let Some(caps) = set_term_regex().captures(term) {
        let key = check_key(&caps[1], term)?;
        let operator = if &caps[2] == "in" {
            Operator::In
        } else {
            Operator::NotIn
        };
        let values: Vec<String> = caps[3]
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            return Err(SelectorError::InvalidValueList(term.to_string()));
        }
        return Ok(Requirement::new(key, operator, values));
    }

    if let Some((key, operator, value)) = parse_equality(term) {
        let key = check_key(key, term)?;
        return Ok(Requirement::new(key, operator, vec![value.trim().to_string()]));
    }

    if let Some(key) = term.strip_prefix('!') {
        return Ok(Requirement::new(
            check_key(key, term)?,
            Operator::DoesNotExist,
            Vec::new(),
        ));
    }

    Ok(Requirement::new(
        check_key(term, term)?,
        Operator::Exists,
        Vec::new(),
    ))
}

fn parse_field_term(term: &str) -> Result<Requirement, SelectorError> {
    let (key, operator, value) =
        parse_equality(term).ok_or_else(|| SelectorError::UnsupportedOperator(term.to_string()))?;
    let key = check_key(key, term)?;
    Ok(Requirement::new(key, operator, vec![value.trim().to_string()]))
}

fn join_requirements(f: &mut fmt::Formatter<'_>, requirements: &[Requirement]) -> fmt::Result {
    let parts: Vec<String> = requirements.iter().map(|r| r.to_string()).collect();
    write!(f, "{}", parts.join(","))
}

/// A parsed label selector; the empty selector matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let requirements = split_terms(input)?
            .into_iter()
            .map(parse_label_term)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl FromStr for LabelSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_requirements(f, &self.requirements)
    }
}

/// A parsed field selector; the empty selector matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<Requirement>,
}

impl FieldSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let requirements = split_terms(input)?
            .into_iter()
            .map(parse_field_term)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn matches(&self, fields: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(fields))
    }
}

impl FromStr for FieldSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_requirements(f, &self.requirements)
    }
}

/// Label and field selectors evaluated together against an object's attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPredicate {
    pub label: LabelSelector,
    pub field: FieldSelector,
}

impl SelectionPredicate {
    pub fn new(label: LabelSelector, field: FieldSelector) -> Self {
        Self { label, field }
    }

    pub fn everything() -> Self {
        Self::default()
    }

    /// Parse optional selector strings; `None` and `""` select everything
    pub fn parse(label: Option<&str>, field: Option<&str>) -> Result<Self, SelectorError> {
        let label = match label {
            Some(s) => LabelSelector::parse(s)?,
            None => LabelSelector::everything(),
        };
        let field = match field {
            Some(s) => FieldSelector::parse(s)?,
            None => FieldSelector::everything(),
        };
        Ok(Self { label, field })
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.field.is_empty()
    }

    pub fn matches(&self, attrs: &Attributes) -> bool {
        self.label.matches(&attrs.labels) && self.field.matches(&attrs.fields)
    }
}
