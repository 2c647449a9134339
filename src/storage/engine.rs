use crate::data::{DocId, Document, Value, ID_FIELD};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::config::StoreConfig;
use super::cursor::Cursor;
use super::events::{EventBus, StoreEvent};
use super::filter::Filter;
use super::options::FindOptions;

/// In-memory document collection backing the alert helpers.
///
/// Cloning is cheap and yields another handle onto the same collection.
/// Each call is serialized by an internal lock; there is no atomicity
/// across calls. Change events are published under the same lock, so
/// subscribers see them in the order the changes were applied.
#[derive(Clone)]
pub struct AlertStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    collection: RwLock<Collection>,
    events: EventBus,
    config: StoreConfig,
}

#[derive(Default)]
struct Collection {
    /// Documents keyed by insertion sequence
    documents: BTreeMap<u64, Document>,
    /// Id to sequence lookup
    index: HashMap<DocId, u64>,
    next_seq: u64,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                collection: RwLock::new(Collection::default()),
                events: EventBus::new(config.event_capacity),
                config,
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Insert a document and return its id.
    ///
    /// A string `_id` already present on the document is kept; otherwise a
    /// fresh random id is assigned.
    pub fn insert(&self, mut document: Document) -> Result<DocId, StoreError> {
        for (key, value) in document.iter() {
            validate_field(key)?;
            validate_value(value)?;
        }

        let requested = match document.get(ID_FIELD) {
            None => None,
            Some(Value::String(s)) => Some(DocId::from(s.as_str())),
            Some(other) => return Err(StoreError::InvalidId(other.type_name())),
        };

        let mut collection = self.inner.collection.write();

        if let Some(max) = self.inner.config.max_documents {
            if collection.documents.len() >= max {
                tracing::warn!(max_documents = max, "Alert store is full");
                return Err(StoreError::CapacityExceeded(max));
            }
        }

        let id = match requested {
            Some(id) if collection.index.contains_key(&id) => {
                return Err(StoreError::DuplicateId(id));
            }
            Some(id) => id,
            None => loop {
                let candidate = DocId::random();
                if !collection.index.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        document.insert(ID_FIELD, id.clone());
        let seq = collection.next_seq;
        collection.next_seq += 1;
        collection.documents.insert(seq, document.clone());
        collection.index.insert(id.clone(), seq);

        tracing::debug!(id = %id, "Inserted document");
        self.inner.events.publish(StoreEvent::Inserted {
            id: id.clone(),
            document,
        });

        Ok(id)
    }

    /// Remove every document matching `filter`, returning how many went away
    pub fn remove(&self, filter: &Filter) -> Result<usize, StoreError> {
        filter.validate()?;

        let mut collection = self.inner.collection.write();
        let seqs: Vec<u64> = collection
            .documents
            .iter()
            .filter(|(_, doc)| filter.matches(doc))
            .map(|(seq, _)| *seq)
            .collect();

        let mut count = 0;
        for seq in seqs {
            let Some(document) = collection.documents.remove(&seq) else {
                continue;
            };
            count += 1;
            if let Some(id) = document.id() {
                collection.index.remove(&id);
                self.inner
                    .events
                    .publish(StoreEvent::Removed { id, document });
            }
        }

        tracing::debug!(count, "Removed documents");
        Ok(count)
    }

    /// Build a lazy cursor over documents matching `filter`
    pub fn find(&self, filter: &Filter, options: FindOptions) -> Result<Cursor, StoreError> {
        filter.validate()?;
        Ok(Cursor::new(self.clone(), filter.clone(), options))
    }

    /// First document matching `filter` under `options`' ordering
    pub fn find_one(
        &self,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.find(filter, options.with_limit(1))?.first())
    }

    /// Look up a document by id
    pub fn get(&self, id: &DocId) -> Option<Document> {
        let collection = self.inner.collection.read();
        let seq = collection.index.get(id)?;
        collection.documents.get(seq).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.collection.read().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.collection.read().documents.is_empty()
    }

    /// Receive every subsequent insert and removal
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Evaluate a query against the current contents
    pub(crate) fn snapshot(&self, filter: &Filter, options: &FindOptions) -> Vec<Document> {
        let mut rows: Vec<(u64, Document)> = {
            let collection = self.inner.collection.read();
            collection
                .documents
                .iter()
                .filter(|(_, doc)| filter.matches(doc))
                .map(|(seq, doc)| (*seq, doc.clone()))
                .collect()
        };

        options.apply_sort(&mut rows);
        options
            .window(rows.into_iter().map(|(_, doc)| doc))
            .collect()
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlertStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertStore")
            .field("documents", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

fn validate_field(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.starts_with('$') {
        return Err(StoreError::InvalidField(key.to_string()));
    }
    Ok(())
}

/// Check every field name nested anywhere inside `value`
fn validate_value(value: &Value) -> Result<(), StoreError> {
    match value {
        Value::Object(map) => map.iter().try_for_each(|(k, v)| {
            validate_field(k)?;
            validate_value(v)
        }),
        Value::Array(items) => items.iter().try_for_each(validate_value),
        _ => Ok(()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid field name '{0}'")]
    InvalidField(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Document id must be a string, got {0}")]
    InvalidId(&'static str),

    #[error("Document '{0}' already exists")]
    DuplicateId(DocId),

    #[error("Store capacity of {0} documents exceeded")]
    CapacityExceeded(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(kind: &str, owner: f64) -> Document {
        Document::new()
            .with("type", kind)
            .with("helperId", owner)
            .with("message", "hello")
    }

    #[test]
    fn test_insert_assigns_unique_ids() {
        let store = AlertStore::new();
        let a = store.insert(alert("info", 1.0)).unwrap();
        let b = store.insert(alert("info", 1.0)).unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&a).unwrap().id(), Some(a));
    }

    #[test]
    fn test_insert_keeps_requested_id() {
        let store = AlertStore::new();
        let id = store
            .insert(alert("info", 1.0).with(ID_FIELD, "custom"))
            .unwrap();
        assert_eq!(id.as_str(), "custom");

        assert!(matches!(
            store.insert(alert("info", 1.0).with(ID_FIELD, "custom")),
            Err(StoreError::DuplicateId(_))
        ));
        assert!(matches!(
            store.insert(alert("info", 1.0).with(ID_FIELD, 7)),
            Err(StoreError::InvalidId("int64"))
        ));
    }

    #[test]
    fn test_insert_rejects_bad_field_names() {
        let store = AlertStore::new();
        assert!(matches!(
            store.insert(Document::new().with("$set", 1)),
            Err(StoreError::InvalidField(_))
        ));
        let nested = Document::from_json(&serde_json::json!({"meta": {"$bad": 1}})).unwrap();
        assert!(matches!(store.insert(nested), Err(StoreError::InvalidField(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_capacity() {
        let store = AlertStore::with_config(StoreConfig::new().with_max_documents(1));
        store.insert(alert("info", 1.0)).unwrap();
        assert!(matches!(
            store.insert(alert("info", 1.0)),
            Err(StoreError::CapacityExceeded(1))
        ));

        store.remove(&Filter::new()).unwrap();
        assert!(store.insert(alert("info", 1.0)).is_ok());
    }

    #[test]
    fn test_remove_by_filter() {
        let store = AlertStore::new();
        store.insert(alert("error", 1.0)).unwrap();
        store.insert(alert("info", 1.0)).unwrap();
        let kept = store.insert(alert("error", 2.0)).unwrap();

        let removed = store
            .remove(&Filter::new().eq("type", "error").eq("helperId", 1.0))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 2);
        assert!(store.get(&kept).is_some());

        assert_eq!(store.remove(&Filter::new().eq("type", "warning")).unwrap(), 0);
    }

    #[test]
    fn test_remove_invalid_filter() {
        let store = AlertStore::new();
        assert!(matches!(
            store.remove(&Filter::new().eq("$where", "x")),
            Err(StoreError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_find_sorted_and_windowed() {
        let store = AlertStore::new();
        for i in 0..5 {
            store
                .insert(alert("info", 1.0).with("createdAt", Value::Timestamp(i)))
                .unwrap();
        }

        let cursor = store
            .find(
                &Filter::new(),
                FindOptions::new().sort_desc("createdAt").with_skip(1).with_limit(2),
            )
            .unwrap();
        let stamps: Vec<i64> = cursor
            .iter()
            .map(|d| d.get("createdAt").and_then(Value::as_i64).unwrap())
            .collect();
        assert_eq!(stamps, vec![3, 2]);
    }

    #[test]
    fn test_find_one() {
        let store = AlertStore::new();
        store.insert(alert("info", 1.0)).unwrap();
        let found = store
            .find_one(&Filter::new().eq("type", "info"), FindOptions::new())
            .unwrap();
        assert!(found.is_some());
        assert!(store
            .find_one(&Filter::new().eq("type", "error"), FindOptions::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_events_published() {
        let store = AlertStore::new();
        let mut rx = store.subscribe();

        let id = store.insert(alert("info", 1.0)).unwrap();
        store.remove(&Filter::new()).unwrap();

        match rx.try_recv().unwrap() {
            StoreEvent::Inserted { id: got, document } => {
                assert_eq!(got, id);
                assert_eq!(document.id(), Some(id.clone()));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(rx.try_recv().unwrap(), StoreEvent::Removed { id: got, .. } if got == id));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_insert_rejects_empty_field_name() {
        let store = AlertStore::new();
        assert!(matches!(
            store.insert(Document::new().with("", 1)),
            Err(StoreError::InvalidField(name)) if name.is_empty()
        ));
    }

    #[test]
    fn test_insert_rejects_bad_names_in_nested_arrays() {
        let store = AlertStore::new();
        let in_array = Document::from_json(&serde_json::json!({"m": [{"$bad": 1}]})).unwrap();
        let in_nested_array =
            Document::from_json(&serde_json::json!({"m": [[{"$bad": 1}]]})).unwrap();
        let deep = Document::from_json(&serde_json::json!({"m": [{"ok": [[{"": 1}]]}]})).unwrap();

        assert!(matches!(store.insert(in_array), Err(StoreError::InvalidField(_))));
        assert!(matches!(store.insert(in_nested_array), Err(StoreError::InvalidField(_))));
        assert!(matches!(store.insert(deep), Err(StoreError::InvalidField(_))));

        let fine = Document::from_json(&serde_json::json!({"m": [[{"ok": 1}], 2]})).unwrap();
        assert!(store.insert(fine).is_ok());
    }

    #[test]
    fn test_find_with_empty_sort_keeps_insertion_order() {
        let store = AlertStore::new();
        for (i, stamp) in [30, 10, 20].into_iter().enumerate() {
            store
                .insert(
                    alert("info", 1.0)
                        .with("n", i as i64)
                        .with("createdAt", Value::Timestamp(stamp)),
                )
                .unwrap();
        }

        let options = FindOptions {
            sort: Some(vec![]),
            ..FindOptions::default()
        };
        let order: Vec<i64> = store
            .find(&Filter::new(), options)
            .unwrap()
            .iter()
            .map(|d| d.get("n").and_then(Value::as_i64).unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_events_follow_change_order_under_contention() {
        const INSERTS: usize = 2_000;

        let store =
            AlertStore::with_config(StoreConfig::new().with_event_capacity(INSERTS * 2 + 16));
        let mut rx = store.subscribe();
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..INSERTS {
                    store.insert(alert("info", 1.0)).unwrap();
                }
                done.store(true, std::sync::atomic::Ordering::SeqCst);
            });
            s.spawn(|| {
                while !done.load(std::sync::atomic::Ordering::SeqCst) {
                    store.remove(&Filter::new()).unwrap();
                }
            });
        });
        store.remove(&Filter::new()).unwrap();

        let mut live = std::collections::HashSet::new();
        let mut received = 0;
        while let Ok(event) = rx.try_recv() {
            received += 1;
            match event {
                StoreEvent::Inserted { id, .. } => assert!(live.insert(id)),
                StoreEvent::Removed { id, .. } => {
                    assert!(live.remove(&id), "removal of {} seen before its insert", id)
                }
            }
        }
        assert_eq!(received, INSERTS * 2);
        assert!(live.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_handles_share_state() {
        let store = AlertStore::new();
        let other = store.clone();
        store.insert(alert("info", 1.0)).unwrap();
        assert_eq!(other.len(), 1);
    }
}
