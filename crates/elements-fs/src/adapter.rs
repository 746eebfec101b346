//! Read-only filesystem facade over an Elements media store.

use crate::attributes::{FileAttributes, MetadataKind, StorageAttributes, Visibility};
use crate::content_cache::DirectoryCache;
use crate::error::{Error, Operation, Reason, Result, RetrievalError};
use crate::prefix::PathPrefixer;
use crate::record_cache::RecordCache;
use crate::roots::{RootResolver, RootStrategy};
use elements_api::{Body, ElementsClient, FileRecord, Record};
use log::{trace, warn};
use std::collections::HashSet;
use std::io::Read;

/// Exposes an Elements media store as a read-only filesystem.
///
/// Paths are slash-separated and relative to the adapter root. Every answer
/// from the server is kept for the adapter's lifetime; create a new adapter
/// to see remote changes.
pub struct ElementsAdapter {
    prefixer: PathPrefixer,
    records: RecordCache,
    directories: DirectoryCache,
}

impl ElementsAdapter {
    pub fn new(client: ElementsClient) -> Self {
        Self::with_options(client, "", RootStrategy::default())
    }

    pub fn with_options(client: ElementsClient, prefix: &str, roots: RootStrategy) -> Self {
        Self {
            prefixer: PathPrefixer::new(prefix),
            records: RecordCache::new(client),
            directories: DirectoryCache::new(RootResolver::new(roots)),
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefixer.prefix()
    }

    pub fn record_cache(&self) -> &RecordCache {
        &self.records
    }

    /// True when `path` is a file or a directory.
    pub fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.check(path)?.is_some())
    }

    pub fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.check(path)?, Some(Record::File(_))))
    }

    pub fn directory_exists(&self, path: &str) -> Result<bool> {
        Ok(matches!(self.check(path)?, Some(Record::Directory(_))))
    }

    /// Alias of [`directory_exists`](Self::directory_exists).
    pub fn is_directory(&self, path: &str) -> Result<bool> {
        self.directory_exists(path)
    }

    /// Entire contents of the file at `path`.
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let mut body = self.read_stream(path)?;
        let mut contents = Vec::new();
        body.read_to_end(&mut contents).map_err(|e| Error::Read {
            path: path.to_string(),
            reason: RetrievalError::new(&self.prefixer.prefix_path(path), e.into()).into(),
        })?;
        Ok(contents)
    }

    /// Contents of the file at `path` as the server streams them.
    pub fn read_stream(&self, path: &str) -> Result<Body> {
        trace!("read_stream({})", path);
        let read_error = |reason: Reason| Error::Read {
            path: path.to_string(),
            reason,
        };

        let file = self.file_record(path).map_err(read_error)?;
        self.records
            .client()
            .download(&file)
            .map_err(|e| read_error(RetrievalError::new(&file.path, e).into()))
    }

    /// Entries below `path`. With `deep`, directories are followed and each
    /// one is listed directly before its own contents.
    pub fn list_contents(&self, path: &str, deep: bool) -> Result<Vec<StorageAttributes>> {
        trace!("list_contents({}, deep: {})", path, deep);
        let mut listed = Vec::new();
        let mut visited = HashSet::new();
        self.collect(&self.prefixer.prefix_path(path), deep, &mut visited, &mut listed)
            .map_err(|e| Error::ListContents {
                path: path.to_string(),
                reason: e.into(),
            })?;
        Ok(listed)
    }

    /// File metadata of `path`. Directories have none.
    pub fn metadata(&self, path: &str, kind: MetadataKind) -> Result<FileAttributes> {
        trace!("metadata({}, {})", path, kind);
        let file = self
            .file_record(path)
            .map_err(|reason| Error::RetrieveMetadata {
                path: path.to_string(),
                kind,
                reason,
            })?;
        let attrs = FileAttributes::from(&file);
        let relative = self.prefixer.strip_prefix(&attrs.path).to_string();
        Ok(FileAttributes {
            path: relative,
            ..attrs
        })
    }

    pub fn visibility(&self, path: &str) -> Result<FileAttributes> {
        self.metadata(path, MetadataKind::Visibility)
    }

    pub fn mime_type(&self, path: &str) -> Result<FileAttributes> {
        self.metadata(path, MetadataKind::MimeType)
    }

    pub fn last_modified(&self, path: &str) -> Result<FileAttributes> {
        self.metadata(path, MetadataKind::LastModified)
    }

    pub fn file_size(&self, path: &str) -> Result<FileAttributes> {
        self.metadata(path, MetadataKind::FileSize)
    }

    /// Attributes of `path`, file or directory.
    pub fn stat(&self, path: &str) -> Result<StorageAttributes> {
        let record = self
            .records
            .lookup(&self.prefixer.prefix_path(path))
            .map_err(|e| Error::CheckExistence {
                path: path.to_string(),
                reason: e.into(),
            })?
            .ok_or_else(|| Error::CheckExistence {
                path: path.to_string(),
                reason: Reason::NotFound,
            })?;
        Ok(self.attributes(&record))
    }

    pub fn write(&self, path: &str, _contents: &[u8]) -> Result<()> {
        unsupported(Operation::Write, path)
    }

    pub fn write_stream(&self, path: &str, _contents: &mut dyn Read) -> Result<()> {
        unsupported(Operation::WriteStream, path)
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        unsupported(Operation::Delete, path)
    }

    pub fn delete_directory(&self, path: &str) -> Result<()> {
        unsupported(Operation::DeleteDirectory, path)
    }

    pub fn create_directory(&self, path: &str) -> Result<()> {
        unsupported(Operation::CreateDirectory, path)
    }

    pub fn set_visibility(&self, path: &str, _visibility: Visibility) -> Result<()> {
        unsupported(Operation::SetVisibility, path)
    }

    pub fn move_file(&self, from: &str, to: &str) -> Result<()> {
        unsupported_transfer(Operation::Move, from, to)
    }

    pub fn copy_file(&self, from: &str, to: &str) -> Result<()> {
        unsupported_transfer(Operation::Copy, from, to)
    }

    fn check(&self, path: &str) -> Result<Option<Record>> {
        trace!("check({})", path);
        self.records
            .lookup(&self.prefixer.prefix_path(path))
            .map_err(|e| Error::CheckExistence {
                path: path.to_string(),
                reason: e.into(),
            })
    }

    fn file_record(&self, path: &str) -> std::result::Result<FileRecord, Reason> {
        match self.records.lookup(&self.prefixer.prefix_path(path))? {
            Some(Record::File(file)) => Ok(file),
            Some(Record::Directory(_)) => Err(Reason::NotAFile),
            None => Err(Reason::NotFound),
        }
    }

    /// Pre-order walk. Children that point back at their parent, or at a
    /// directory already walked, are skipped so a cyclic answer from the
    /// server ends the walk.
    fn collect(
        &self,
        store_path: &str,
        deep: bool,
        visited: &mut HashSet<String>,
        listed: &mut Vec<StorageAttributes>,
    ) -> std::result::Result<(), RetrievalError> {
        visited.insert(store_path.to_string());
        for child in self.directories.children(&self.records, store_path)? {
            if child.path().is_empty() || child.path() == store_path {
                warn!("skipping {:?} listed under itself", child.path());
                continue;
            }
            listed.push(self.attributes(&child));
            if deep && child.is_dir() && !visited.contains(child.path()) {
                self.collect(child.path(), deep, visited, listed)?;
            }
        }
        Ok(())
    }

    /// Attributes with the path made relative to the adapter root.
    fn attributes(&self, record: &Record) -> StorageAttributes {
        let attrs = StorageAttributes::from(record);
        let relative = self.prefixer.strip_prefix(attrs.path()).to_string();
        attrs.with_path(relative)
    }
}

fn unsupported(operation: Operation, path: &str) -> Result<()> {
    Err(Error::Unsupported {
        operation,
        path: path.to_string(),
    })
}

fn unsupported_transfer(operation: Operation, from: &str, to: &str) -> Result<()> {
    Err(Error::UnsupportedTransfer {
        operation,
        from: from.to_string(),
        to: to.to_string(),
    })
}
