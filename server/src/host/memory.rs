//! In-memory [`EntrySource`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use sift_engine::{natural_id, Entry, Error, Result};

use super::EntrySource;

#[derive(Default)]
pub struct MemorySource {
    entries: Mutex<Vec<(String, Entry)>>,
    failure: Mutex<Option<Error>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(self, collection: &str, entries: Vec<Entry>) -> Self {
        for entry in entries {
            self.insert(collection, entry);
        }
        self
    }

    pub fn insert(&self, collection: &str, entry: Entry) {
        self.entries
            .lock()
            .unwrap()
            .push((collection.to_string(), entry));
    }

    pub fn remove(&self, collection: &str, id: &str) {
        self.entries.lock().unwrap().retain(|(c, entry)| {
            !(c == collection && natural_id(entry, None).as_deref() == Some(id))
        });
    }

    pub fn fail_with(&self, error: Option<Error>) {
        *self.failure.lock().unwrap() = error;
    }

    fn check(&self) -> Result<()> {
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntrySource for MemorySource {
    async fn fetch_entry(
        &self,
        collection: &str,
        id: &str,
        _populate: Option<&Value>,
    ) -> Result<Option<Entry>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|(c, entry)| c == collection && natural_id(entry, None).as_deref() == Some(id))
            .map(|(_, entry)| entry.clone()))
    }

    async fn fetch_entries(
        &self,
        collection: &str,
        start: usize,
        limit: usize,
        _populate: Option<&Value>,
    ) -> Result<Vec<Entry>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == collection)
            .skip(start)
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}
