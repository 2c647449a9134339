pub mod config;
pub mod cursor;
pub mod engine;
pub mod events;
pub mod filter;
pub mod options;

pub use config::StoreConfig;
pub use cursor::Cursor;
pub use engine::{AlertStore, StoreError};
pub use events::{EventBus, StoreEvent};
pub use filter::Filter;
pub use options::{FindOptions, SortDirection, SortKey};
