//! Per-owner alert facade

use crate::data::{DocId, Document, Value};
use crate::storage::{AlertStore, Cursor, Filter, FindOptions, StoreError};

use super::config::{
    AlertKind, HelperConfig, MessageExtraction, ReservedFields, CREATED_AT_FIELD,
    HELPER_ID_FIELD, MESSAGE_FIELD, REASON_FIELD, RESERVED_FIELDS, TYPE_FIELD,
};

/// Adds, finds and clears alerts on behalf of one owner (a view, a session).
///
/// Every alert it writes is tagged with the helper's id, and `find`/`clear`
/// only ever see alerts carrying that id. The scoping is a convention: code
/// holding the store directly can read or delete anything.
#[derive(Debug, Clone)]
pub struct AlertHelper {
    id: f64,
    store: AlertStore,
    config: HelperConfig,
}

impl AlertHelper {
    pub fn new(store: AlertStore) -> Self {
        Self::with_config(store, HelperConfig::default())
    }

    pub fn with_config(store: AlertStore, config: HelperConfig) -> Self {
        // Millisecond clock plus a random fraction in [0, 1)
        let id = chrono::Utc::now().timestamp_millis() as f64 + rand::random::<f64>();
        Self { id, store, config }
    }

    pub fn id(&self) -> f64 {
        self.id
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// Insert an alert of type `kind` and return its id.
    ///
    /// `extra` is merged over the base fields. Store errors are returned
    /// unchanged.
    pub fn add(
        &self,
        kind: &str,
        message: impl Into<Value>,
        extra: Option<Document>,
    ) -> Result<DocId, StoreError> {
        let message = self.effective_message(message.into());

        let mut document = Document::new()
            .with(TYPE_FIELD, kind)
            .with(CREATED_AT_FIELD, Value::Timestamp(chrono::Utc::now().timestamp_millis()))
            .with(HELPER_ID_FIELD, self.id)
            .with(MESSAGE_FIELD, message);

        if let Some(extra) = extra {
            document.merge(self.screen_extra(extra));
        }

        let id = self.store.insert(document)?;
        tracing::debug!(helper_id = self.id, kind = %kind, id = %id, "Alert added");
        Ok(id)
    }

    pub fn add_error(
        &self,
        message: impl Into<Value>,
        extra: Option<Document>,
    ) -> Result<DocId, StoreError> {
        self.add(AlertKind::Error.as_str(), message, extra)
    }

    pub fn add_info(
        &self,
        message: impl Into<Value>,
        extra: Option<Document>,
    ) -> Result<DocId, StoreError> {
        self.add(AlertKind::Info.as_str(), message, extra)
    }

    pub fn add_success(
        &self,
        message: impl Into<Value>,
        extra: Option<Document>,
    ) -> Result<DocId, StoreError> {
        self.add(AlertKind::Success.as_str(), message, extra)
    }

    pub fn add_warning(
        &self,
        message: impl Into<Value>,
        extra: Option<Document>,
    ) -> Result<DocId, StoreError> {
        self.add(AlertKind::Warning.as_str(), message, extra)
    }

    /// Remove this helper's alerts matching `filter`
    pub fn clear(&self, filter: Filter) -> Result<usize, StoreError> {
        let removed = self.store.remove(&self.scoped(filter))?;
        tracing::debug!(helper_id = self.id, removed, "Alerts cleared");
        Ok(removed)
    }

    /// Lazily query this helper's alerts, newest first unless `options`
    /// carries its own sort
    pub fn find(&self, filter: Filter, mut options: FindOptions) -> Result<Cursor, StoreError> {
        if options.sort.is_none() {
            options = options.sort_desc(CREATED_AT_FIELD);
        }
        self.store.find(&self.scoped(filter), options)
    }

    fn scoped(&self, filter: Filter) -> Filter {
        filter.and(Filter::new().eq(HELPER_ID_FIELD, self.id))
    }

    fn effective_message(&self, message: Value) -> Value {
        if self.config.message_extraction == MessageExtraction::Verbatim {
            return message;
        }
        let extracted = match &message {
            Value::Object(fields) => [REASON_FIELD, MESSAGE_FIELD]
                .iter()
                .filter_map(|key| fields.get(*key))
                .find(|v| v.is_truthy())
                .cloned(),
            _ => None,
        };
        extracted.unwrap_or(message)
    }

    fn screen_extra(&self, mut extra: Document) -> Document {
        if self.config.reserved_fields == ReservedFields::Protect {
            for field in RESERVED_FIELDS {
                if extra.remove(field).is_some() {
                    tracing::warn!(helper_id = self.id, field, "Ignoring reserved field in extra");
                }
            }
        }
        extra
    }
}
