//! Tidings demo
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - TIDINGS_MAX_DOCUMENTS: Maximum alerts held at once (default: unbounded)
//! - TIDINGS_EVENT_CAPACITY: Change event buffer size (default: 1024)
//! - RUST_LOG: Log level (default: tidings=info)

use tidings::alerts::TYPE_FIELD;
use tidings::{Alert, AlertHelper, AlertStore, Document, Filter, FindOptions, StoreConfig, StoreEvent};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidings=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env();
    tracing::info!("Tidings configuration:");
    match config.max_documents {
        Some(max) => tracing::info!("  Max documents: {}", max),
        None => tracing::info!("  Max documents: unbounded"),
    }
    tracing::info!("  Event capacity: {}", config.event_capacity);

    let store = AlertStore::with_config(config);

    // Log every change as it happens
    let mut events = store.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Inserted { id, document }) => {
                    tracing::info!(id = %id, kind = ?document.get(TYPE_FIELD), "Alert added");
                }
                Ok(StoreEvent::Removed { id, .. }) => {
                    tracing::info!(id = %id, "Alert removed");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Event watcher lagged behind the store");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let session = AlertHelper::new(store.clone());
    let sidebar = AlertHelper::new(store.clone());

    session.add_error(serde_json::json!({"reason": "Invalid password"}), None)?;
    session.add_info("Two new messages", Some(Document::new().with("priority", 1)))?;
    session.add_success("Profile saved", None)?;
    sidebar.add_warning("Disk almost full", None)?;

    let cleared = session.clear(Filter::new().eq(TYPE_FIELD, "error"))?;
    tracing::info!(cleared, "Cleared session errors");

    for helper in [&session, &sidebar] {
        let alerts = helper
            .find(Filter::new(), FindOptions::new())?
            .fetch_as::<Alert>()?;
        println!("helper {}:", helper.id());
        println!("{}", serde_json::to_string_pretty(&alerts)?);
    }

    drop(store);
    drop(session);
    drop(sidebar);
    watcher.await?;

    Ok(())
}
