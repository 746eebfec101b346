//! Filesystem-shaped attributes produced from remote records.

use crate::mime::guess_mime_type;
use chrono::{DateTime, Utc};
use elements_api::{FileRecord, Record};
use std::fmt;

/// Visibility of an entry. Everything served by the store is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Which piece of file metadata a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Visibility,
    MimeType,
    LastModified,
    FileSize,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::Visibility => "visibility",
            MetadataKind::MimeType => "mime type",
            MetadataKind::LastModified => "last modified",
            MetadataKind::FileSize => "file size",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    pub path: String,
    pub size: u64,
    pub visibility: Visibility,
    pub modified_at: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryAttributes {
    pub path: String,
    pub visibility: Visibility,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Attributes of one listed or inspected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageAttributes {
    File(FileAttributes),
    Directory(DirectoryAttributes),
}

impl StorageAttributes {
    pub fn path(&self) -> &str {
        match self {
            StorageAttributes::File(file) => &file.path,
            StorageAttributes::Directory(dir) => &dir.path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, StorageAttributes::Directory(_))
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        match self {
            StorageAttributes::File(file) => file.modified_at,
            StorageAttributes::Directory(dir) => dir.modified_at,
        }
    }

    pub(crate) fn with_path(mut self, new_path: String) -> Self {
        match &mut self {
            StorageAttributes::File(file) => file.path = new_path,
            StorageAttributes::Directory(dir) => dir.path = new_path,
        }
        self
    }
}

impl From<&Record> for StorageAttributes {
    fn from(record: &Record) -> Self {
        match record {
            Record::Directory(dir) => StorageAttributes::Directory(DirectoryAttributes {
                path: dir.path.clone(),
                visibility: Visibility::Public,
                modified_at: dir.modified_at,
            }),
            Record::File(file) => StorageAttributes::File(file.into()),
        }
    }
}

impl From<&FileRecord> for FileAttributes {
    fn from(file: &FileRecord) -> Self {
        FileAttributes {
            path: file.path.clone(),
            size: file.size,
            visibility: Visibility::Public,
            modified_at: file.modified_at,
            mime_type: guess_mime_type(&file.path).map(str::to_string),
        }
    }
}
