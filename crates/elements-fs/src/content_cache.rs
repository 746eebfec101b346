use crate::error::RetrievalError;
use crate::flight::FlightMap;
use crate::record_cache::RecordCache;
use crate::roots::RootResolver;
use elements_api::Record;
use log::{debug, trace};
use std::sync::Arc;

/// Memoizes `directory store path -> ordered child paths`.
///
/// Filling an entry seeds the [`RecordCache`] with every child, so stat or
/// read of a listed child costs no further request.
pub struct DirectoryCache {
    listings: FlightMap<Arc<Vec<String>>>,
    roots: RootResolver,
}

impl DirectoryCache {
    pub fn new(roots: RootResolver) -> Self {
        Self {
            listings: FlightMap::new(),
            roots,
        }
    }

    pub fn root_resolver(&self) -> &RootResolver {
        &self.roots
    }

    /// Children of the directory at `path`, in server order.
    ///
    /// The empty path is the store root. A path that does not exist has no
    /// children.
    pub fn children(
        &self,
        records: &RecordCache,
        path: &str,
    ) -> Result<Vec<Record>, RetrievalError> {
        let mut fetched = None;
        let listing = self.listings.get_or_try_fill(path, || {
            debug!("directory cache miss: {:?}", path);
            let children = self.fetch(records, path)?;
            for child in &children {
                records.seed(child);
            }
            let paths = children.iter().map(|c| c.path().to_string()).collect();
            fetched = Some(children);
            Ok::<_, RetrievalError>(Arc::new(paths))
        })?;

        if let Some(children) = fetched {
            return Ok(children);
        }

        trace!("directory cache hit: {:?}", path);
        // Seeding never overwrites, so a child recorded as absent before the
        // listing stays absent and is skipped.
        Ok(listing
            .iter()
            .filter_map(|child| records.peek(child).flatten())
            .collect())
    }

    fn fetch(&self, records: &RecordCache, path: &str) -> Result<Vec<Record>, RetrievalError> {
        if path.is_empty() {
            return self.roots.roots(records.client());
        }

        let parent = match records.lookup(path)? {
            Some(Record::Directory(dir)) => dir,
            Some(Record::File(_)) | None => return Ok(Vec::new()),
        };

        let id = match parent.id {
            Some(id) => id,
            // Roots are synthesized without an id.
            None => match records
                .resolve(path)?
                .and_then(|record| record.id().cloned())
            {
                Some(id) => id,
                None => return Ok(Vec::new()),
            },
        };

        records
            .client()
            .children(&id)
            .map_err(|e| RetrievalError::new(path, e))
    }
}
