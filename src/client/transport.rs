//! # HTTP Transport
//!
//! Separa il client dal trasporto HTTP vero e proprio.
//!
//! ## Responsabilità:
//! - `Transport`: trait asincrono usato da `MegaOptimClient` (post + download)
//! - `HttpTransport`: implementazione con `reqwest`
//!   - header `X-API-KEY` e `User-Agent` su ogni chiamata API
//!   - multipart se la richiesta contiene upload (file inviati in streaming), altrimenti form urlencoded
//!   - download in streaming, chunk per chunk, senza API key
//!
//! Il corpo della risposta viene restituito così com'è: il parsing JSON
//! (e il relativo errore di trasporto) avviene nel client.

use crate::{
    error::{OptimizeError, Result},
    request::OptimizationRequest,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    multipart::{Form, Part},
    Body,
};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Client identifier sent with every API request
pub const USER_AGENT: &str = concat!("MegaOptim Rust Client v", env!("CARGO_PKG_VERSION"));

/// Network seam of the job client
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `request` to `endpoint` and return the raw response body
    async fn post(
        &self,
        endpoint: &str,
        request: &OptimizationRequest,
        timeout: Option<Duration>,
    ) -> Result<String>;

    /// Stream `url` into the file at `destination`, returning the bytes written
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;
}

/// `reqwest` based transport talking to the real service
pub struct HttpTransport {
    api: reqwest::Client,
    downloads: reqwest::Client,
}

impl HttpTransport {
    pub fn new(api_key: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(OptimizeError::MissingParameter(
                "MegaOptim API key".to_string(),
            ));
        }

        let mut key = HeaderValue::from_str(api_key.trim()).map_err(|_| {
            OptimizeError::Validation("API key contains invalid characters".to_string())
        })?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-API-KEY", key);

        let api = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        let downloads = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self { api, downloads })
    }

    async fn multipart_form(request: &OptimizationRequest) -> Result<Form> {
        let mut form = Form::new();
        for (key, value) in &request.fields {
            form = form.text(key.clone(), value.clone());
        }

        for upload in &request.uploads {
            let file = tokio::fs::File::open(&upload.path).await?;
            let length = file.metadata().await?.len();
            let file_name = upload
                .path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| upload.field.clone());
            debug!("Attaching {} as '{}' ({} bytes)", upload.path.display(), upload.field, length);
            let part = Part::stream_with_length(Body::from(file), length).file_name(file_name);
            form = form.part(upload.field.clone(), part);
        }

        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        endpoint: &str,
        request: &OptimizationRequest,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let mut builder = self.api.post(endpoint);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        builder = if request.is_multipart() {
            builder.multipart(Self::multipart_form(request).await?)
        } else {
            builder.form(&request.fields)
        };

        let response = builder.send().await.map_err(map_http_error)?;
        debug!("POST {} -> {}", endpoint, response.status());

        // Error statuses still carry a JSON body with the service's errors
        response.text().await.map_err(map_http_error)
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        let mut response = self
            .downloads
            .get(url)
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(map_http_error)? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Downloaded {} bytes from {} to {}", written, url, destination.display());
        Ok(written)
    }
}

fn map_http_error(err: reqwest::Error) -> OptimizeError {
    if err.is_timeout() {
        OptimizeError::Timeout(err.to_string())
    } else {
        OptimizeError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_is_missing_parameter() {
        assert!(matches!(HttpTransport::new(""), Err(OptimizeError::MissingParameter(_))));
        assert!(matches!(HttpTransport::new("   "), Err(OptimizeError::MissingParameter(_))));
    }

    #[test]
    fn test_invalid_api_key_characters() {
        assert!(matches!(
            HttpTransport::new("key\nwith-newline"),
            Err(OptimizeError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_multipart_form_streams_existing_files() {
        use crate::request::Upload;

        let dir = tempfile::TempDir::new().unwrap();
        let image = dir.path().join("1.png");
        std::fs::write(&image, b"png-bytes").unwrap();

        let mut request = OptimizationRequest::empty();
        request.fields.push(("type".to_string(), "file".to_string()));
        request.uploads.push(Upload {
            field: "file".to_string(),
            path: image,
        });

        let form = HttpTransport::multipart_form(&request).await.unwrap();
        assert!(!form.boundary().is_empty());

        request.uploads.push(Upload {
            field: "file1".to_string(),
            path: dir.path().join("missing.png"),
        });
        assert!(matches!(
            HttpTransport::multipart_form(&request).await,
            Err(OptimizeError::Io(_))
        ));
    }

    #[test]
    fn test_user_agent_names_client() {
        assert!(USER_AGENT.starts_with("MegaOptim Rust Client v"));
    }
}
