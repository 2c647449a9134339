//! Query modifiers for `find`

use std::cmp::Ordering;

use crate::data::{Document, Value};

/// Sort direction for a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Options accepted by `find`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Sort keys in priority order. `None` means insertion order.
    pub sort: Option<Vec<SortKey>>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sort key
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.get_or_insert_with(Vec::new).push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn sort_asc(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortDirection::Ascending)
    }

    pub fn sort_desc(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortDirection::Descending)
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort `(sequence, document)` pairs in place.
    ///
    /// Missing fields sort as null. Ties fall back to insertion sequence,
    /// reversed when the leading key is descending.
    pub(crate) fn apply_sort(&self, rows: &mut [(u64, Document)]) {
        let Some(keys) = self.sort.as_ref().filter(|k| !k.is_empty()) else {
            return;
        };
        let newest_first = keys[0].direction == SortDirection::Descending;

        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            for key in keys {
                let va = a.get_path(&key.field).unwrap_or(&Value::Null);
                let vb = b.get_path(&key.field).unwrap_or(&Value::Null);
                let cmp = va.cmp(vb);
                if cmp != Ordering::Equal {
                    return match key.direction {
                        SortDirection::Ascending => cmp,
                        SortDirection::Descending => cmp.reverse(),
                    };
                }
            }
            if newest_first {
                seq_b.cmp(seq_a)
            } else {
                seq_a.cmp(seq_b)
            }
        });
    }

    /// Apply skip and limit to an already ordered sequence
    pub(crate) fn window<I: Iterator<Item = Document>>(
        &self,
        rows: I,
    ) -> impl Iterator<Item = Document> {
        rows.skip(self.skip).take(self.limit.unwrap_or(usize::MAX))
    }
}
