use crate::error::RetrievalError;
use crate::flight::FlightMap;
use elements_api::{ElementsClient, Record};
use log::{debug, trace};

/// Memoizes `store path -> record or absent` for the adapter's lifetime.
///
/// Keys are exact store paths; callers prefix once before looking up.
pub struct RecordCache {
    client: ElementsClient,
    entries: FlightMap<Option<Record>>,
}

impl RecordCache {
    pub fn new(client: ElementsClient) -> Self {
        Self {
            client,
            entries: FlightMap::new(),
        }
    }

    pub fn client(&self) -> &ElementsClient {
        &self.client
    }

    /// Record at `path`, or `None` if the store has nothing there.
    ///
    /// Only the first call per path reaches the server; a failed call is
    /// not remembered.
    pub fn lookup(&self, path: &str) -> Result<Option<Record>, RetrievalError> {
        self.entries.get_or_try_fill(path, || {
            debug!("record cache miss: {}", path);
            self.client
                .find_by_path(path)
                .map_err(|e| RetrievalError::new(path, e))
        })
    }

    /// Ask the server for the record at `path` and cache it in place of
    /// whatever was stored. Used for root directories, which are listed
    /// without an id or timestamps. An absent answer keeps the old entry.
    pub fn resolve(&self, path: &str) -> Result<Option<Record>, RetrievalError> {
        debug!("resolving record {}", path);
        let record = self
            .client
            .find_by_path(path)
            .map_err(|e| RetrievalError::new(path, e))?;
        if let Some(record) = &record {
            self.entries.replace(path, Some(record.clone()));
        }
        Ok(record)
    }

    /// Cached entry for `path` without touching the server. The outer
    /// `Option` is `None` when the path was never looked up.
    pub fn peek(&self, path: &str) -> Option<Option<Record>> {
        let entry = self.entries.get(path);
        trace!("record cache peek {}: {}", path, entry.is_some());
        entry
    }

    /// Remember `record` under its own path unless that path already has an
    /// entry.
    pub fn seed(&self, record: &Record) {
        self.entries
            .insert_if_vacant(record.path(), Some(record.clone()));
    }

    /// Number of paths with a cached answer.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
