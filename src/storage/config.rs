//! Store configuration

/// Default broadcast capacity for change events
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Configuration for an [`AlertStore`](super::AlertStore)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of documents held at once (`None` = unbounded)
    pub max_documents: Option<usize>,
    /// Ring buffer size of the change event channel
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_documents: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_documents(mut self, max: usize) -> Self {
        self.max_documents = Some(max);
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Read configuration from the environment.
    ///
    /// - `TIDINGS_MAX_DOCUMENTS`: document cap (default: unbounded)
    /// - `TIDINGS_EVENT_CAPACITY`: event channel capacity (default: 1024)
    ///
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_documents = lookup("TIDINGS_MAX_DOCUMENTS").and_then(|v| v.trim().parse().ok());
        let event_capacity = lookup("TIDINGS_EVENT_CAPACITY")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_EVENT_CAPACITY);

        Self {
            max_documents,
            event_capacity,
        }
    }
}
