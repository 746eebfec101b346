//! Media file records and the single place where raw JSON becomes a typed
//! [`Record`].

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::io::Read;

/// Opaque identifier assigned by the Elements server.
///
/// The API emits identifiers as JSON numbers, some deployments as strings.
/// Both are kept verbatim in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A directory entry in the media store.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryRecord {
    /// Remote identifier. Synthetic root records have none.
    pub id: Option<RecordId>,
    /// Canonical slash-separated path.
    pub path: String,
    /// Last modification time, when the server reports one.
    pub modified_at: Option<DateTime<Utc>>,
}

impl DirectoryRecord {
    /// A directory known only by its path, as produced for top-level roots.
    pub fn synthetic(path: impl Into<String>) -> Self {
        Self {
            id: None,
            path: path.into(),
            modified_at: None,
        }
    }
}

/// A file entry in the media store.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Remote identifier.
    pub id: Option<RecordId>,
    /// Bundle identifier used by download endpoints of older deployments.
    /// Never equal to `id`.
    pub download_id: Option<RecordId>,
    /// Canonical slash-separated path.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified_at: Option<DateTime<Utc>>,
}

/// One filesystem entry as returned by the Elements server.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Directory(DirectoryRecord),
    File(FileRecord),
}

impl Record {
    pub fn path(&self) -> &str {
        match self {
            Record::Directory(dir) => &dir.path,
            Record::File(file) => &file.path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Record::Directory(_))
    }

    pub fn id(&self) -> Option<&RecordId> {
        match self {
            Record::Directory(dir) => dir.id.as_ref(),
            Record::File(file) => file.id.as_ref(),
        }
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Record::Directory(dir) => dir.modified_at,
            Record::File(file) => file.modified_at,
        }
    }
}

/// A top-level root returned by the roots endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RootEntry {
    pub path: String,
}

/// A root returned by the resolved permissions endpoint.
///
/// `full_path` still carries the volume path it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionEntry {
    #[serde(rename = "fullPath", alias = "full_path")]
    pub full_path: String,
}

/// A storage volume.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VolumeEntry {
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(u64),
    Text(String),
}

impl From<WireId> for RecordId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => RecordId::from(n),
            WireId::Text(s) => RecordId(s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

impl WireTimestamp {
    fn into_datetime(self) -> Option<DateTime<Utc>> {
        match self {
            WireTimestamp::Seconds(secs) => DateTime::from_timestamp(secs, 0),
            WireTimestamp::Fractional(secs) => {
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9) as u32;
                DateTime::from_timestamp(whole as i64, nanos)
            }
            WireTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Record as it appears on the wire. Every field is optional here; the
/// conversion into [`Record`] decides what is acceptable.
#[derive(Debug, Deserialize)]
struct WireRecord {
    id: Option<WireId>,
    is_dir: Option<bool>,
    path: Option<String>,
    size: Option<u64>,
    mtime: Option<WireTimestamp>,
    bundle: Option<WireId>,
}

impl TryFrom<WireRecord> for Record {
    type Error = Error;

    fn try_from(wire: WireRecord) -> Result<Self> {
        let path = wire
            .path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::malformed(None, "missing path"))?;
        let is_dir = wire
            .is_dir
            .ok_or_else(|| Error::malformed(Some(&path), "missing is_dir"))?;

        let modified_at = match wire.mtime {
            Some(ts) => Some(
                ts.into_datetime()
                    .ok_or_else(|| Error::malformed(Some(&path), "invalid mtime"))?,
            ),
            None => None,
        };
        let id = wire.id.map(RecordId::from);

        if is_dir {
            return Ok(Record::Directory(DirectoryRecord {
                id,
                path,
                modified_at,
            }));
        }

        let size = wire
            .size
            .ok_or_else(|| Error::malformed(Some(&path), "file without size"))?;
        let download_id = wire
            .bundle
            .map(RecordId::from)
            .filter(|bundle| id.as_ref() != Some(bundle));
        if id.is_none() && download_id.is_none() {
            return Err(Error::malformed(Some(&path), "file without id or bundle"));
        }

        Ok(Record::File(FileRecord {
            id,
            download_id,
            path,
            size,
            modified_at,
        }))
    }
}

/// Parse a JSON array of records. A `null` body counts as empty.
pub fn parse_records<R: Read>(body: R) -> Result<Vec<Record>> {
    let wire: Option<Vec<WireRecord>> = serde_json::from_reader(body)?;
    wire.unwrap_or_default()
        .into_iter()
        .map(Record::try_from)
        .collect()
}

/// Parse a JSON array of plain entries (roots, volumes, permissions).
pub fn parse_entries<T, R>(body: R) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let entries: Option<Vec<T>> = serde_json::from_reader(body)?;
    Ok(entries.unwrap_or_default())
}
