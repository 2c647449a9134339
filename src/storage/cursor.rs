//! Lazy query results
//!
//! A [`Cursor`] captures a query, not its results: every iteration
//! re-evaluates it against the store, so the same cursor reflects later
//! inserts and removals.

use crate::data::Document;

use super::engine::AlertStore;
use super::filter::Filter;
use super::options::FindOptions;

#[derive(Debug, Clone)]
pub struct Cursor {
    store: AlertStore,
    filter: Filter,
    options: FindOptions,
}

impl Cursor {
    pub(crate) fn new(store: AlertStore, filter: Filter, options: FindOptions) -> Self {
        Self {
            store,
            filter,
            options,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Run the query and collect the matching documents
    pub fn fetch(&self) -> Vec<Document> {
        self.store.snapshot(&self.filter, &self.options)
    }

    /// Run the query and decode every document into `T`
    pub fn fetch_as<T>(&self) -> Result<Vec<T>, T::Error>
    where
        T: TryFrom<Document>,
    {
        self.fetch().into_iter().map(T::try_from).collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Document> {
        self.fetch().into_iter()
    }

    /// Number of documents the query currently yields (after skip/limit)
    pub fn count(&self) -> usize {
        self.fetch().len()
    }

    pub fn first(&self) -> Option<Document> {
        self.iter().next()
    }
}

impl IntoIterator for &Cursor {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
