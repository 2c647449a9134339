//! Equality filters over documents
//!
//! A filter is a set of `field == value` constraints that must all hold.
//! Field names may be dotted paths into nested objects, and a `Null`
//! constraint also matches documents where the field is missing.

use std::collections::BTreeMap;

use crate::data::{Document, Value};

use super::engine::StoreError;

/// Conjunction of field equality constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    constraints: BTreeMap<String, Value>,
}

impl Filter {
    /// The empty filter, matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an equality constraint
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(field.into(), value.into());
        self
    }

    /// Combine two filters; constraints from `other` win on the same field
    pub fn and(mut self, other: Filter) -> Self {
        self.constraints.extend(other.constraints);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.constraints.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Reject shapes the store cannot evaluate
    pub fn validate(&self) -> Result<(), StoreError> {
        for field in self.constraints.keys() {
            if field.is_empty() {
                return Err(StoreError::InvalidFilter("empty field name".to_string()));
            }
            if field.starts_with('$') {
                return Err(StoreError::InvalidFilter(format!(
                    "unsupported operator '{}'",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Check whether a document satisfies every constraint
    pub fn matches(&self, doc: &Document) -> bool {
        self.constraints
            .iter()
            .all(|(field, expected)| match doc.get_path(field) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<Document> for Filter {
    fn from(doc: Document) -> Self {
        Self {
            constraints: doc.into_fields(),
        }
    }
}

impl TryFrom<&serde_json::Value> for Filter {
    type Error = StoreError;

    fn try_from(json: &serde_json::Value) -> Result<Self, Self::Error> {
        Document::from_json(json)
            .map(Filter::from)
            .ok_or_else(|| StoreError::InvalidFilter("filter must be an object".to_string()))
    }
}
