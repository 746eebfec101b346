//! The four queries the filesystem layer needs, plus the two used to
//! resolve permission-scoped roots.

use crate::record::{
    parse_entries, parse_records, FileRecord, PermissionEntry, Record, RecordId, RootEntry,
    VolumeEntry,
};
use crate::transport::{ApiRequest, Body, HttpClient};
use crate::{Error, Result};
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use std::sync::Arc;

/// Characters escaped when an id is placed in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Endpoint paths, relative to the server base URL.
///
/// `download` contains an `{id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub files: String,
    pub roots: String,
    pub volumes: String,
    pub permissions: String,
    pub download: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            files: "api/2/media/files".to_string(),
            roots: "api/2/media/roots".to_string(),
            volumes: "api/2/volumes".to_string(),
            permissions: "api/2/media/roots/permissions".to_string(),
            download: "api/2/media/files/{id}/download".to_string(),
        }
    }
}

impl Endpoints {
    /// Endpoints of deployments that still serve downloads by bundle id.
    pub fn legacy() -> Self {
        Self {
            download: "api/media/download/{id}".to_string(),
            ..Self::default()
        }
    }

    fn download_for(&self, id: &RecordId) -> String {
        let segment = utf8_percent_encode(id.as_str(), PATH_SEGMENT).to_string();
        self.download.replace("{id}", &segment)
    }
}

/// Which identifier of a file record keys the download request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadKey {
    /// The record id.
    #[default]
    Id,
    /// The bundle id, falling back to the record id.
    Bundle,
}

impl FileRecord {
    /// Identifier to download this file with, if the record carries one.
    pub fn download_key(&self, key: DownloadKey) -> Option<&RecordId> {
        match key {
            DownloadKey::Id => self.id.as_ref().or(self.download_id.as_ref()),
            DownloadKey::Bundle => self.download_id.as_ref().or(self.id.as_ref()),
        }
    }
}

/// Typed client for the Elements media endpoints.
#[derive(Clone)]
pub struct ElementsClient {
    http: Arc<dyn HttpClient>,
    endpoints: Endpoints,
    download_key: DownloadKey,
}

impl ElementsClient {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            endpoints: Endpoints::default(),
            download_key: DownloadKey::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_download_key(mut self, download_key: DownloadKey) -> Self {
        self.download_key = download_key;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn download_key(&self) -> DownloadKey {
        self.download_key
    }

    /// Look up the record stored at exactly `path`.
    pub fn find_by_path(&self, path: &str) -> Result<Option<Record>> {
        let request = ApiRequest::new(&self.endpoints.files)
            .query("path", path)
            .query("limit", 1);
        let records = parse_records(self.send(&request)?)?;
        Ok(records.into_iter().next())
    }

    /// All direct children of the directory with the given id, in server order.
    pub fn children(&self, parent: &RecordId) -> Result<Vec<Record>> {
        let request = ApiRequest::new(&self.endpoints.files).query("parent", parent);
        parse_records(self.send(&request)?)
    }

    pub fn roots(&self) -> Result<Vec<RootEntry>> {
        parse_entries(self.send(&ApiRequest::new(&self.endpoints.roots))?)
    }

    pub fn volumes(&self) -> Result<Vec<VolumeEntry>> {
        parse_entries(self.send(&ApiRequest::new(&self.endpoints.volumes))?)
    }

    pub fn resolved_permissions(&self) -> Result<Vec<PermissionEntry>> {
        parse_entries(self.send(&ApiRequest::new(&self.endpoints.permissions))?)
    }

    /// Stream the contents of `file`.
    pub fn download(&self, file: &FileRecord) -> Result<Body> {
        let id = file
            .download_key(self.download_key)
            .ok_or_else(|| Error::malformed(Some(&file.path), "no download identifier"))?;
        self.send(&ApiRequest::new(self.endpoints.download_for(id)))
    }

    fn send(&self, request: &ApiRequest) -> Result<Body> {
        debug!("elements request: {}", request);
        self.http.get(request)
    }
}

impl std::fmt::Debug for ElementsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementsClient")
            .field("endpoints", &self.endpoints)
            .field("download_key", &self.download_key)
            .finish_non_exhaustive()
    }
}
