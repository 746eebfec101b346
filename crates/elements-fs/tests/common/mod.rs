#![allow(dead_code)]

use elements_api::{ApiRequest, Body, ElementsClient, Error, HttpClient};
use elements_fs::{ElementsAdapter, RootStrategy};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Mock HTTP backend: answers requests from per-URL queues of canned bodies
/// and records every request it sees.
#[derive(Default)]
pub struct MockHttp {
    routes: Mutex<HashMap<String, VecDeque<Result<String, u16>>>>,
    history: Mutex<Vec<ApiRequest>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue `body` as the answer to the next request matching `request`
    /// (endpoint plus query, as rendered by `ApiRequest`'s `Display`).
    pub fn respond(&self, request: &str, body: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(request.to_string())
            .or_default()
            .push_back(Ok(body.to_string()));
        self
    }

    /// Queue an HTTP error status for the next matching request.
    pub fn fail(&self, request: &str, status: u16) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(request.to_string())
            .or_default()
            .push_back(Err(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.to_string())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }
}

impl HttpClient for MockHttp {
    fn get(&self, request: &ApiRequest) -> elements_api::Result<Body> {
        self.history.lock().unwrap().push(request.clone());
        let key = request.to_string();
        let next = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("unexpected request {}", key));
        match next {
            Ok(body) => Ok(Box::new(Cursor::new(body.into_bytes()))),
            Err(status) => Err(Error::Http { status, url: key }),
        }
    }
}

pub fn adapter(http: &Arc<MockHttp>) -> ElementsAdapter {
    ElementsAdapter::new(ElementsClient::new(http.clone()))
}

pub fn adapter_with(
    http: &Arc<MockHttp>,
    prefix: &str,
    strategy: RootStrategy,
) -> ElementsAdapter {
    ElementsAdapter::with_options(ElementsClient::new(http.clone()), prefix, strategy)
}

pub fn lookup(path: &str) -> String {
    format!("api/2/media/files?path={}&limit=1", path)
}

pub fn children(id: u64) -> String {
    format!("api/2/media/files?parent={}", id)
}
