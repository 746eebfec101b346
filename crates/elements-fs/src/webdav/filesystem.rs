//! WebDAV filesystem implementation for an Elements media store.
//!
//! This module implements the `dav_server::fs::DavFileSystem` trait on top
//! of [`ElementsAdapter`]. Adapter calls block on HTTP, so each one runs on
//! the blocking thread pool. File contents are streamed from the download
//! endpoint as they are read.

use crate::adapter::ElementsAdapter;
use crate::attributes::StorageAttributes;
use bytes::Bytes;
use dav_server::davpath::DavPath;
use dav_server::fs::{
    DavDirEntry, DavFile, DavFileSystem, DavMetaData, FsError, FsFuture, FsStream, OpenOptions,
    ReadDirMeta,
};
use elements_api::Body;
use futures::stream;
use log::{debug, error, trace};
use std::io::{self, Read, SeekFrom};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

/// WebDAV filesystem adapter for an Elements media store.
///
/// Read-only: any open for writing is `Forbidden`.
#[derive(Clone)]
pub struct ElementsDavFs {
    inner: Arc<ElementsDavFsInner>,
}

struct ElementsDavFsInner {
    adapter: Arc<ElementsAdapter>,
    /// Fallback timestamp for entries without a modification time.
    created: SystemTime,
}

impl ElementsDavFs {
    pub fn new(adapter: Arc<ElementsAdapter>) -> Self {
        Self {
            inner: Arc::new(ElementsDavFsInner {
                adapter,
                created: SystemTime::now(),
            }),
        }
    }

    pub fn adapter(&self) -> &ElementsAdapter {
        &self.inner.adapter
    }
}

/// Adapter-relative path for a DAV path.
fn rel_path(path: &DavPath) -> String {
    path.as_rel_ospath()
        .to_string_lossy()
        .trim_matches('/')
        .to_string()
}

fn to_fs_error(err: crate::Error) -> FsError {
    if err.is_not_found() {
        FsError::NotFound
    } else if err.is_unsupported() {
        FsError::Forbidden
    } else {
        error!("{}", err);
        FsError::GeneralFailure
    }
}

/// Run a blocking adapter call off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, FsError>
where
    F: FnOnce() -> Result<T, FsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|_| FsError::GeneralFailure)?
}

impl DavFileSystem for ElementsDavFs {
    fn open<'a>(&'a self, path: &'a DavPath, options: OpenOptions) -> FsFuture<'a, Box<dyn DavFile>> {
        trace!("open({:?}, {:?})", path, options);

        let rel = rel_path(path);
        let adapter = Arc::clone(&self.inner.adapter);
        let created = self.inner.created;

        Box::pin(async move {
            if options.write || options.create || options.create_new || options.truncate {
                return Err(FsError::Forbidden);
            }

            let meta = {
                let adapter = Arc::clone(&adapter);
                let rel = rel.clone();
                blocking(move || {
                    let attrs = adapter.stat(&rel).map_err(to_fs_error)?;
                    if attrs.is_dir() {
                        return Err(FsError::Forbidden);
                    }
                    Ok(ElementsDavMetaData::new(&attrs, created))
                })
                .await?
            };

            Ok(Box::new(ElementsDavFile::new(adapter, rel, meta)) as Box<dyn DavFile>)
        })
    }

    fn read_dir<'a>(
        &'a self,
        path: &'a DavPath,
        meta: ReadDirMeta,
    ) -> FsFuture<'a, FsStream<Box<dyn DavDirEntry>>> {
        trace!("read_dir({:?}, {:?})", path, meta);

        let rel = rel_path(path);
        let adapter = Arc::clone(&self.inner.adapter);
        let created = self.inner.created;

        Box::pin(async move {
            let listed = blocking(move || {
                if !rel.is_empty() && !adapter.directory_exists(&rel).map_err(to_fs_error)? {
                    return Err(FsError::NotFound);
                }
                adapter.list_contents(&rel, false).map_err(to_fs_error)
            })
            .await?;

            let entries: Vec<Box<dyn DavDirEntry>> = listed
                .iter()
                .map(|attrs| {
                    Box::new(ElementsDavDirEntry::new(attrs, created)) as Box<dyn DavDirEntry>
                })
                .collect();

            debug!("read_dir: returning {} entries", entries.len());

            let stream = stream::iter(entries.into_iter().map(Ok));
            Ok(Box::pin(stream) as FsStream<Box<dyn DavDirEntry>>)
        })
    }

    fn metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        trace!("metadata({:?})", path);

        let rel = rel_path(path);
        let adapter = Arc::clone(&self.inner.adapter);
        let created = self.inner.created;

        Box::pin(async move {
            if rel.is_empty() {
                return Ok(Box::new(ElementsDavMetaData::directory(created)) as Box<dyn DavMetaData>);
            }

            let attrs = blocking(move || adapter.stat(&rel).map_err(to_fs_error)).await?;
            Ok(Box::new(ElementsDavMetaData::new(&attrs, created)) as Box<dyn DavMetaData>)
        })
    }
}

/// A file read through its download stream.
///
/// The stream is opened on the first read and consumed sequentially. Seeking
/// forward skips bytes; seeking backward reopens the download.
struct ElementsDavFile {
    adapter: Arc<ElementsAdapter>,
    path: String,
    meta: ElementsDavMetaData,
    download: Arc<Mutex<Option<Download>>>,
    position: u64,
}

struct Download {
    body: Body,
    offset: u64,
}

impl std::fmt::Debug for ElementsDavFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementsDavFile")
            .field("path", &self.path)
            .field("meta", &self.meta)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl ElementsDavFile {
    fn new(adapter: Arc<ElementsAdapter>, path: String, meta: ElementsDavMetaData) -> Self {
        Self {
            adapter,
            path,
            meta,
            download: Arc::new(Mutex::new(None)),
            position: 0,
        }
    }
}

/// Up to `count` bytes starting at `position`, reusing the open download
/// when it has not yet passed `position`.
fn read_at(
    adapter: &ElementsAdapter,
    path: &str,
    download: &mut Option<Download>,
    position: u64,
    count: usize,
) -> Result<Bytes, FsError> {
    if download.as_ref().map_or(true, |d| d.offset > position) {
        debug!("opening download of {} at {}", path, position);
        let body = adapter.read_stream(path).map_err(to_fs_error)?;
        *download = Some(Download { body, offset: 0 });
    }
    let Some(download) = download.as_mut() else {
        return Err(FsError::GeneralFailure);
    };

    if download.offset < position {
        let wanted = position - download.offset;
        let skipped = io::copy(&mut (&mut download.body).take(wanted), &mut io::sink())
            .map_err(|e| stream_error(path, e))?;
        download.offset += skipped;
        if skipped < wanted {
            return Ok(Bytes::new());
        }
    }

    let mut chunk = Vec::new();
    (&mut download.body)
        .take(count as u64)
        .read_to_end(&mut chunk)
        .map_err(|e| stream_error(path, e))?;
    download.offset += chunk.len() as u64;
    Ok(Bytes::from(chunk))
}

fn stream_error(path: &str, err: io::Error) -> FsError {
    error!("reading {}: {}", path, err);
    FsError::GeneralFailure
}

impl DavFile for ElementsDavFile {
    fn metadata(&mut self) -> FsFuture<'_, Box<dyn DavMetaData>> {
        let meta = self.meta.clone();
        Box::pin(async move { Ok(Box::new(meta) as Box<dyn DavMetaData>) })
    }

    fn read_bytes(&mut self, count: usize) -> FsFuture<'_, Bytes> {
        let adapter = Arc::clone(&self.adapter);
        let path = self.path.clone();
        let download = Arc::clone(&self.download);
        let position = self.position;

        Box::pin(async move {
            let chunk = blocking(move || {
                let mut download = download.lock().unwrap_or_else(PoisonError::into_inner);
                read_at(&adapter, &path, &mut download, position, count)
            })
            .await?;
            self.position += chunk.len() as u64;
            Ok(chunk)
        })
    }

    fn seek(&mut self, pos: SeekFrom) -> FsFuture<'_, u64> {
        let new_pos = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => self.meta.len as i64 + n,
            SeekFrom::Current(n) => self.position as i64 + n,
        };

        if new_pos < 0 {
            return Box::pin(async { Err(FsError::GeneralFailure) });
        }

        self.position = new_pos as u64;
        let pos = self.position;
        Box::pin(async move { Ok(pos) })
    }

    fn write_buf(&mut self, _buf: Box<dyn bytes::Buf + Send>) -> FsFuture<'_, ()> {
        Box::pin(async { Err(FsError::Forbidden) })
    }

    fn write_bytes(&mut self, _buf: Bytes) -> FsFuture<'_, ()> {
        Box::pin(async { Err(FsError::Forbidden) })
    }

    fn flush(&mut self) -> FsFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

struct ElementsDavDirEntry {
    name: String,
    meta: ElementsDavMetaData,
}

impl ElementsDavDirEntry {
    fn new(attrs: &StorageAttributes, created: SystemTime) -> Self {
        let name = attrs
            .path()
            .rsplit('/')
            .next()
            .unwrap_or(attrs.path())
            .to_string();
        Self {
            name,
            meta: ElementsDavMetaData::new(attrs, created),
        }
    }
}

impl DavDirEntry for ElementsDavDirEntry {
    fn name(&self) -> Vec<u8> {
        self.name.as_bytes().to_vec()
    }

    fn metadata(&self) -> FsFuture<'_, Box<dyn DavMetaData>> {
        let meta = self.meta.clone();
        Box::pin(async move { Ok(Box::new(meta) as Box<dyn DavMetaData>) })
    }
}

#[derive(Clone, Debug)]
struct ElementsDavMetaData {
    is_dir: bool,
    len: u64,
    modified: SystemTime,
    created: SystemTime,
}

impl ElementsDavMetaData {
    fn directory(time: SystemTime) -> Self {
        Self {
            is_dir: true,
            len: 0,
            modified: time,
            created: time,
        }
    }

    fn new(attrs: &StorageAttributes, created: SystemTime) -> Self {
        let modified = attrs.modified_at().map(SystemTime::from).unwrap_or(created);
        let len = match attrs {
            StorageAttributes::File(file) => file.size,
            StorageAttributes::Directory(_) => 0,
        };
        Self {
            is_dir: attrs.is_dir(),
            len,
            modified,
            created,
        }
    }
}

impl DavMetaData for ElementsDavMetaData {
    fn len(&self) -> u64 {
        self.len
    }

    fn modified(&self) -> Result<SystemTime, FsError> {
        Ok(self.modified)
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn created(&self) -> Result<SystemTime, FsError> {
        Ok(self.created)
    }
}
