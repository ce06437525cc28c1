//! ExternalName store walkthrough
//!
//! Composes the `ExternalName` store over the configured backend, then runs
//! through create, filtered list, watch and table rendering.
//!
//! ```text
//! cargo run --example external_name [-- path/to/storage.yaml]
//! ```

use anyhow::Result;
use kindstore::apis::external_name;
use kindstore::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => StorageConfig::from_yaml_file(&path)?,
        None => StorageConfig::default(),
    };
    let getter = Arc::new(ConfigOptionsGetter::new(config)?);
    let store = external_name::new_storage(getter)?;

    println!("📦 Serving {}", store.group_resource());

    let mut events = store.watch(&ListOptions::in_namespace("default")).await?;

    let create = CreateOptions::default();
    store
        .create(ExternalName::new("default", "svc-a", "Example.COM."), &create)
        .await?;
    store
        .create(ExternalName::new("default", "svc-b", "api.example.org"), &create)
        .await?;
    store
        .create(ExternalName::without_host("default", "svc-c"), &create)
        .await?;

    for _ in 0..3 {
        if let Some(event) = events.next().await {
            let event = event?;
            println!(
                "👀 {} {}",
                event.event_type.as_str(),
                event.object.metadata.name
            );
        }
    }

    let matching = store
        .list(&ListOptions::in_namespace("default").with_field_selector("spec.host=example.com"))
        .await?;
    println!(
        "\n🔎 spec.host=example.com → {:?}",
        matching
            .items
            .iter()
            .map(|obj| obj.metadata.name.as_str())
            .collect::<Vec<_>>()
    );

    let all = store.list(&ListOptions::in_namespace("default")).await?;
    let table = store.convert_to_table(TableSource::List(&all), &TableOptions::default())?;
    println!("\n📋 Table:\n{}", serde_json::to_string_pretty(&table)?);

    Ok(())
}
