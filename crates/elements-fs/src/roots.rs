//! Listing of the filesystem root.

use crate::error::RetrievalError;
use elements_api::{DirectoryRecord, ElementsClient, Record};
use log::debug;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};

/// How the top-level directories are discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootStrategy {
    /// The roots endpoint returns usable paths.
    #[default]
    Direct,
    /// The resolved permissions endpoint returns full paths that still
    /// carry their volume path, which is stripped off.
    PermissionScoped,
}

/// Produces the synthetic directory records listed at the root.
pub struct RootResolver {
    strategy: RootStrategy,
    volume_paths: Mutex<Option<Vec<String>>>,
}

impl RootResolver {
    pub fn new(strategy: RootStrategy) -> Self {
        Self {
            strategy,
            volume_paths: Mutex::new(None),
        }
    }

    pub fn strategy(&self) -> RootStrategy {
        self.strategy
    }

    /// Top-level directories. An empty response is an empty listing.
    pub fn roots(&self, client: &ElementsClient) -> Result<Vec<Record>, RetrievalError> {
        let paths = match self.strategy {
            RootStrategy::Direct => client
                .roots()
                .map_err(|e| RetrievalError::new("", e))?
                .into_iter()
                .map(|root| root.path)
                .collect::<Vec<_>>(),
            RootStrategy::PermissionScoped => {
                let volumes = self.volume_paths(client)?;
                client
                    .resolved_permissions()
                    .map_err(|e| RetrievalError::new("", e))?
                    .into_iter()
                    .map(|entry| strip_volume_path(&volumes, &entry.full_path).to_string())
                    .collect()
            }
        };
        // A permission on a whole volume strips down to the root itself.
        let roots: Vec<Record> = paths
            .into_iter()
            .filter(|path| !path.is_empty())
            .map(|path| Record::Directory(DirectoryRecord::synthetic(path)))
            .collect();
        debug!("resolved {} roots", roots.len());
        Ok(roots)
    }

    /// Volume paths, fetched on first use and kept for the resolver's
    /// lifetime. Sorted longest first.
    fn volume_paths(&self, client: &ElementsClient) -> Result<Vec<String>, RetrievalError> {
        let mut cached = self
            .volume_paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(paths) = cached.as_ref() {
            return Ok(paths.clone());
        }

        let mut paths: Vec<String> = client
            .volumes()
            .map_err(|e| RetrievalError::new("", e))?
            .into_iter()
            .map(|volume| volume.path.trim_end_matches('/').to_string())
            .filter(|path| !path.is_empty())
            .collect();
        paths.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        debug!("loaded {} volume paths", paths.len());

        *cached = Some(paths.clone());
        Ok(paths)
    }
}

/// Remove the longest volume path that prefixes `full_path` on a segment
/// boundary. `volumes` must be sorted longest first.
fn strip_volume_path<'a>(volumes: &[String], full_path: &'a str) -> &'a str {
    for volume in volumes {
        if let Some(rest) = full_path.strip_prefix(volume.as_str()) {
            if rest.is_empty() || rest.starts_with('/') {
                return rest.trim_start_matches('/');
            }
        }
    }
    full_path.trim_start_matches('/')
}
