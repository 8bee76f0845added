//! # Remote Job Client Module
//!
//! Client per l'API di ottimizzazione remota.
//!
//! ## Responsabilità:
//! - `submit()`: invia risorsa + opzioni a `POST <base>/optimize`
//! - `get_result()`: attende il completamento con `POST <base>/optimize/<id>/result?timeout=<s>`
//! - `optimize()`: submit + (se `processing`) una singola chiamata di poll
//! - `download()`: scarica un risultato tramite il trasporto
//!
//! ## Macchina a stati per submission:
//! ```text
//! Submitted -> Completed | Processing | Failed
//! Processing -> Completed | Failed        (tramite il poll)
//! ```
//!
//! Nessun retry lato client: il timeout è codificato nella query string e il
//! server tiene aperta la richiesta fino al completamento del job.

pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use transport::{HttpTransport, Transport, USER_AGENT};
pub use types::{JobDescriptor, JobStatus, ResultItem};

use crate::{
    error::{OptimizeError, Result},
    options::OptimizationOptions,
    request::{OptimizationRequest, RequestBuilder},
    resource::Resource,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.megaoptim.com/v1/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Extra client-side allowance on top of the server-side poll timeout
const POLL_GRACE: Duration = Duration::from_secs(30);

/// Client for the MegaOptim optimization API
pub struct MegaOptimClient<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
}

impl MegaOptimClient<HttpTransport> {
    /// Client for the public API endpoint
    pub fn new(api_key: &str) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(api_key)?, DEFAULT_BASE_URL))
    }
}

impl<T: Transport> MegaOptimClient<T> {
    pub fn with_transport(transport: T, base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { transport, base_url }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn optimize_endpoint(&self) -> String {
        format!("{}optimize", self.base_url)
    }

    pub fn result_endpoint(&self, process_id: &str, timeout: Duration) -> String {
        format!(
            "{}optimize/{}/result?timeout={}",
            self.base_url,
            process_id,
            timeout.as_secs()
        )
    }

    /// Submit one resource; returns whatever state the service reports
    pub async fn submit(
        &self,
        resource: &Resource,
        options: &OptimizationOptions,
    ) -> Result<JobDescriptor> {
        let request = RequestBuilder::new()
            .options(options.clone())
            .resource(resource.clone())
            .build()?;

        debug!(
            "Submitting {} resource(s) as '{}' ({})",
            resource.len(),
            resource.kind(),
            if request.is_multipart() { "multipart upload" } else { "form post" }
        );

        let body = self
            .transport
            .post(&self.optimize_endpoint(), &request, None)
            .await?;
        JobDescriptor::parse(&body)
    }

    /// Block until the job finishes or the server-side timeout elapses
    pub async fn get_result(&self, process_id: &str, timeout: Duration) -> Result<JobDescriptor> {
        if process_id.trim().is_empty() {
            return Err(OptimizeError::MissingParameter(
                "process id returned by the optimize endpoint".to_string(),
            ));
        }

        debug!("Waiting up to {}s for job {}", timeout.as_secs(), process_id);

        let body = self
            .transport
            .post(
                &self.result_endpoint(process_id, timeout),
                &OptimizationRequest::empty(),
                Some(timeout.saturating_add(POLL_GRACE)),
            )
            .await?;
        JobDescriptor::parse(&body)
    }

    /// Submit and, unless a callback URL was given, wait for the final result
    pub async fn optimize(
        &self,
        resource: &Resource,
        options: &OptimizationOptions,
        timeout: Duration,
    ) -> Result<JobDescriptor> {
        let job = self.submit(resource, options).await?;

        match job.status {
            JobStatus::Ok => Ok(job),
            JobStatus::Error => Err(remote_error(job)),
            JobStatus::Processing => {
                if options.has_callback() {
                    info!("Job queued, results will be posted to the callback url");
                    return Ok(job);
                }

                let process_id = job.process_id.as_deref().ok_or_else(|| {
                    OptimizeError::Transport("processing response without process_id".to_string())
                })?;

                let result = self.get_result(process_id, timeout).await?;
                match result.status {
                    JobStatus::Ok => Ok(result),
                    JobStatus::Error => Err(remote_error(result)),
                    JobStatus::Processing => Err(OptimizeError::Timeout(format!(
                        "job {} still processing after {}s",
                        process_id,
                        timeout.as_secs()
                    ))),
                }
            }
        }
    }

    pub async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        self.transport.download(url, destination).await
    }
}

fn remote_error(job: JobDescriptor) -> OptimizeError {
    if job.errors.is_empty() {
        OptimizeError::RemoteOptimization(vec![format!(
            "service reported an error (code {})",
            job.code
        )])
    } else {
        OptimizeError::RemoteOptimization(job.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    const BASE: &str = "https://api.test/v1";

    fn image(dir: &TempDir, name: &str) -> Resource {
        let path = dir.path().join(name);
        std::fs::write(&path, b"png").unwrap();
        Resource::File(path)
    }

    #[test]
    fn test_endpoints() {
        let client = MegaOptimClient::with_transport(MockTransport::always_ok(1), BASE);
        assert_eq!(client.optimize_endpoint(), "https://api.test/v1/optimize");
        assert_eq!(
            client.result_endpoint("abc", Duration::from_secs(300)),
            "https://api.test/v1/optimize/abc/result?timeout=300"
        );
    }

    #[tokio::test]
    async fn test_submit_sends_upload_and_type() {
        let dir = TempDir::new().unwrap();
        let seen: Arc<Mutex<Option<OptimizationRequest>>> = Arc::new(Mutex::new(None));
        let captured = seen.clone();
        let transport = MockTransport::new(move |_, request| {
            *captured.lock().unwrap() = Some(request.clone());
            Ok(json!({"status": "ok", "code": 200, "result": []}).to_string())
        });
        let client = MegaOptimClient::with_transport(transport, BASE);

        let job = assert_ok!(client.submit(&image(&dir, "1.png"), &OptimizationOptions::default()).await);
        assert!(job.is_complete());

        let request = seen.lock().unwrap().clone().unwrap();
        assert!(request.is_multipart());
        assert_eq!(request.field("type"), Some("file"));
        assert_eq!(request.field("keep_exif"), Some("1"));
    }

    #[tokio::test]
    async fn test_optimize_ok_returns_without_polling() {
        let dir = TempDir::new().unwrap();
        let client = MegaOptimClient::with_transport(MockTransport::always_ok(512), BASE);

        let job = client
            .optimize(&image(&dir, "a.png"), &OptimizationOptions::default(), DEFAULT_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(job.result.len(), 1);
        assert_eq!(client.transport().submit_count(), 1);
        assert_eq!(client.transport().poll_count(), 0);
    }

    #[tokio::test]
    async fn test_optimize_polls_processing_job() {
        let poll = json!({
            "status": "ok",
            "code": 200,
            "result": [{"success": true, "file_name": "4.jpg", "saved_bytes": 10, "url": "https://cdn.test/4.jpg"}]
        })
        .to_string();
        let client = MegaOptimClient::with_transport(MockTransport::processing_then(&poll), BASE);
        let resource = Resource::Urls(vec!["https://example.com/4.jpg".to_string()]);

        let job = client
            .optimize(&resource, &OptimizationOptions::default(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(job.is_complete());
        assert_eq!(client.transport().poll_count(), 1);
        assert_eq!(
            client.transport().last_poll_timeout(),
            Some(Duration::from_secs(60) + POLL_GRACE)
        );
    }

    #[tokio::test]
    async fn test_callback_url_skips_polling() {
        let client = MegaOptimClient::with_transport(MockTransport::processing_then("{}"), BASE);
        let options = OptimizationOptions {
            callback_url: Some("https://example.com/hook".to_string()),
            ..Default::default()
        };

        let job = client
            .optimize(&Resource::Url("https://example.com/a.jpg".to_string()), &options, DEFAULT_TIMEOUT)
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(client.transport().poll_count(), 0);
    }

    #[tokio::test]
    async fn test_poll_that_never_completes_times_out() {
        let still_processing = json!({"status": "processing", "code": 202, "process_id": "job-42"}).to_string();
        let client = MegaOptimClient::with_transport(MockTransport::processing_then(&still_processing), BASE);

        let err = client
            .optimize(
                &Resource::Url("https://example.com/a.jpg".to_string()),
                &OptimizationOptions::default(),
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OptimizeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_huge_timeout_saturates_poll_bound() {
        let still_processing = json!({"status": "processing", "code": 202, "process_id": "job-42"}).to_string();
        let client = MegaOptimClient::with_transport(MockTransport::processing_then(&still_processing), BASE);

        let err = client
            .optimize(
                &Resource::Url("https://example.com/a.jpg".to_string()),
                &OptimizationOptions::default(),
                Duration::from_secs(u64::MAX),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OptimizeError::Timeout(_)));
        assert_eq!(client.transport().last_poll_timeout(), Some(Duration::MAX));
    }

    #[tokio::test]
    async fn test_remote_error_carries_messages() {
        let transport = MockTransport::new(|_, _| {
            Ok(json!({"status": "error", "code": 401, "errors": ["Invalid API key"]}).to_string())
        });
        let client = MegaOptimClient::with_transport(transport, BASE);

        let err = client
            .optimize(
                &Resource::Url("https://example.com/a.jpg".to_string()),
                &OptimizationOptions::default(),
                DEFAULT_TIMEOUT,
            )
            .await
            .unwrap_err();

        match err {
            OptimizeError::RemoteOptimization(errors) => assert_eq!(errors, vec!["Invalid API key"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_response() {
        let transport = MockTransport::new(|_, _| Ok("Internal Server Error".to_string()));
        let client = MegaOptimClient::with_transport(transport, BASE);

        let result = client
            .submit(&Resource::Url("https://example.com/a.jpg".to_string()), &OptimizationOptions::default())
            .await;
        assert!(matches!(assert_err!(result), OptimizeError::Transport(_)));
    }

    #[tokio::test]
    async fn test_empty_process_id() {
        let client = MegaOptimClient::with_transport(MockTransport::always_ok(1), BASE);
        assert!(matches!(
            client.get_result("", DEFAULT_TIMEOUT).await,
            Err(OptimizeError::MissingParameter(_))
        ));
        assert_eq!(client.transport().poll_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_group_fails_before_network() {
        let client = MegaOptimClient::with_transport(MockTransport::always_ok(1), BASE);
        let urls: Vec<String> = (1..=6).map(|i| format!("https://example.com/{}.jpg", i)).collect();

        let outcome = match Resource::group(&urls) {
            Ok(resource) => client
                .optimize(&resource, &OptimizationOptions::default(), DEFAULT_TIMEOUT)
                .await,
            Err(e) => Err(e),
        };

        assert!(matches!(outcome, Err(OptimizeError::InvalidResource(_))));
        assert_eq!(client.transport().submit_count(), 0);
    }
}
