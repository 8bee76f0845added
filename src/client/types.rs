//! Typed responses of the optimization API.

use crate::error::{OptimizeError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Outcome reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Ok,
    Processing,
    Error,
}

/// Response of both `/optimize` and `/optimize/<id>/result`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub status: JobStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: u16,
    #[serde(default)]
    pub process_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<ResultItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

impl JobDescriptor {
    /// Parse a raw response body; anything that isn't the expected JSON is a transport error
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| OptimizeError::Transport(e.to_string()))
    }

    /// Final results are ready and the request succeeded
    pub fn is_complete(&self) -> bool {
        self.status == JobStatus::Ok && self.code == 200
    }
}

/// Missing keys and explicit `null` both mean "empty"
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One optimized image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub optimized_size: u64,
    /// Can be zero or negative when the service could not shrink the file
    #[serde(default, deserialize_with = "null_as_default")]
    pub saved_bytes: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub saved_percent: f64,
    /// Missing when this item failed
    #[serde(default)]
    pub url: Option<String>,
}
