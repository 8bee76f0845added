//! In-process stand-in for the optimization service, used by the tests.

use super::transport::Transport;
use crate::{
    error::{OptimizeError, Result},
    request::OptimizationRequest,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const OPTIMIZED_BYTES: &[u8] = b"optimized-image-bytes";

type Responder = Box<dyn Fn(&str, &OptimizationRequest) -> Result<String> + Send + Sync>;

pub struct MockTransport {
    responder: Responder,
    failing_downloads: Mutex<HashSet<String>>,
    submits: AtomicUsize,
    polls: AtomicUsize,
    downloads: Mutex<Vec<(String, PathBuf)>>,
    last_poll_timeout: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &OptimizationRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            failing_downloads: Mutex::new(HashSet::new()),
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            downloads: Mutex::new(Vec::new()),
            last_poll_timeout: Mutex::new(None),
        }
    }

    /// Always `status=ok`, one item per uploaded file with the given savings
    pub fn always_ok(saved_bytes: i64) -> Self {
        Self::new(move |_, request| Ok(ok_body(request, saved_bytes, |_| true)))
    }

    /// Like `always_ok`, but items whose file name is in `null_urls` get `url: null`
    pub fn ok_with_null_urls(saved_bytes: i64, null_urls: &[&str]) -> Self {
        let null_urls: HashSet<String> = null_urls.iter().map(|s| s.to_string()).collect();
        Self::new(move |_, request| {
            Ok(ok_body(request, saved_bytes, |name| !null_urls.contains(name)))
        })
    }

    /// Submit answers `processing`, the poll answers with `poll_body`
    pub fn processing_then(poll_body: &str) -> Self {
        let poll_body = poll_body.to_string();
        Self::new(move |endpoint, _| {
            if endpoint.contains("/result") {
                Ok(poll_body.clone())
            } else {
                Ok(json!({"status": "processing", "code": 202, "process_id": "job-42"}).to_string())
            }
        })
    }

    pub fn fail_download(&self, url: &str) {
        self.failing_downloads.lock().unwrap().insert(url.to_string());
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> Vec<(String, PathBuf)> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn last_poll_timeout(&self) -> Option<Duration> {
        *self.last_poll_timeout.lock().unwrap()
    }
}

pub fn cdn_url(file_name: &str) -> String {
    format!("https://cdn.test/optimized/{}", file_name)
}

pub fn ok_body<F>(request: &OptimizationRequest, saved_bytes: i64, has_url: F) -> String
where
    F: Fn(&str) -> bool,
{
    let items: Vec<_> = request
        .uploads
        .iter()
        .map(|upload| {
            let name = upload
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let url = if has_url(&name) { Some(cdn_url(&name)) } else { None };
            json!({
                "success": url.is_some(),
                "file_name": name,
                "original_size": 2 * 1024 * 1024,
                "optimized_size": 2 * 1024 * 1024 - saved_bytes,
                "saved_bytes": saved_bytes,
                "saved_percent": 50.0,
                "url": url,
            })
        })
        .collect();

    json!({"status": "ok", "code": 200, "result": items}).to_string()
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        endpoint: &str,
        request: &OptimizationRequest,
        timeout: Option<Duration>,
    ) -> Result<String> {
        if endpoint.contains("/result") {
            self.polls.fetch_add(1, Ordering::SeqCst);
            *self.last_poll_timeout.lock().unwrap() = timeout;
        } else {
            self.submits.fetch_add(1, Ordering::SeqCst);
        }
        (self.responder)(endpoint, request)
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        if self.failing_downloads.lock().unwrap().contains(url) {
            return Err(OptimizeError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("connection reset while fetching {}", url),
            )));
        }
        std::fs::write(destination, OPTIMIZED_BYTES)?;
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), destination.to_path_buf()));
        Ok(OPTIMIZED_BYTES.len() as u64)
    }
}
