//! Tidings: In-Memory Alert Helpers
//!
//! Transient, owner-scoped notifications (errors, info, success, warnings)
//! kept in an in-process document store.
//!
//! # Features
//!
//! - **Scoped Helpers**: each helper only sees and clears the alerts it created
//! - **Document Store**: insert, remove-by-filter and find with sort/skip/limit
//! - **Lazy Cursors**: queries re-run on every iteration
//! - **Change Events**: broadcast notifications for inserts and removals
//!
//! # Example
//!
//! ```no_run
//! use tidings::{AlertHelper, AlertStore, Document, Filter, FindOptions};
//!
//! let store = AlertStore::new();
//! let helper = AlertHelper::new(store.clone());
//!
//! helper.add_error("Login failed", None).unwrap();
//! helper.add_info("Welcome back", Some(Document::new().with("priority", 1))).unwrap();
//!
//! // Newest first
//! for alert in &helper.find(Filter::new(), FindOptions::new()).unwrap() {
//!     println!("{}", alert.to_json());
//! }
//!
//! helper.clear(Filter::new().eq("type", "error")).unwrap();
//! ```

pub mod alerts;
pub mod data;
pub mod storage;

// Re-export commonly used types
pub use alerts::{Alert, AlertHelper, AlertKind, HelperConfig, MessageExtraction, ReservedFields};
pub use data::{DocId, Document, Value};
pub use storage::{AlertStore, Cursor, Filter, FindOptions, StoreConfig, StoreError, StoreEvent};
