//! # Resource Locator Module
//!
//! Normalizza gli input dell'utente in una risorsa validata.
//!
//! ## Forme supportate:
//! - `File`: singolo path locale esistente
//! - `Url`: singolo URL (scheme + host + path)
//! - `Files`: gruppo di 1-5 path locali
//! - `Urls`: gruppo di 1-5 URL
//!
//! Un gruppo deve essere omogeneo: tutti URL oppure tutti file esistenti.
//! La classificazione avviene una sola volta, alla costruzione.

use crate::error::{OptimizeError, Result};
use reqwest::Url;
use std::path::{Path, PathBuf};

/// Maximum number of resources in one submission
pub const MAX_GROUP_SIZE: usize = 5;

/// A validated optimization input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    File(PathBuf),
    Url(String),
    Files(Vec<PathBuf>),
    Urls(Vec<String>),
}

impl Resource {
    /// Classify a single item: URL first, then existing local file
    pub fn new(item: impl AsRef<str>) -> Result<Self> {
        let item = item.as_ref();
        if is_valid_url(item) {
            Ok(Self::Url(item.to_string()))
        } else if Path::new(item).is_file() {
            Ok(Self::File(PathBuf::from(item)))
        } else {
            Err(OptimizeError::InvalidResource(format!(
                "'{}' is neither a valid url nor an existing file",
                item
            )))
        }
    }

    /// Single local file, for callers that already hold a path
    pub fn file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_file() {
            Ok(Self::File(path))
        } else {
            Err(OptimizeError::InvalidResource(format!(
                "'{}' is not an existing file",
                path.display()
            )))
        }
    }

    /// Classify a group of 1 to 5 items; the group must be all URLs or all files
    pub fn group<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();

        if items.is_empty() || items.len() > MAX_GROUP_SIZE {
            return Err(OptimizeError::InvalidResource(format!(
                "a group must contain between 1 and {} items, got {}",
                MAX_GROUP_SIZE,
                items.len()
            )));
        }

        if items.iter().all(|item| is_valid_url(item)) {
            return Ok(Self::Urls(items));
        }

        if items.iter().all(|item| Path::new(item).is_file()) {
            return Ok(Self::Files(items.into_iter().map(PathBuf::from).collect()));
        }

        Err(OptimizeError::InvalidResource(
            "group mixes urls and files, or contains an invalid item".to_string(),
        ))
    }

    /// One item becomes a single resource, more become a group
    pub fn from_items(items: &[String]) -> Result<Self> {
        match items {
            [single] => Self::new(single),
            _ => Self::group(items),
        }
    }

    /// The `type` discriminator sent to the service
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Url(_) => "url",
            Self::Files(_) => "files",
            Self::Urls(_) => "urls",
        }
    }

    /// Local files must be uploaded; URLs are sent by reference
    pub fn requires_upload(&self) -> bool {
        matches!(self, Self::File(_) | Self::Files(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::File(_) | Self::Url(_) => 1,
            Self::Files(files) => files.len(),
            Self::Urls(urls) => urls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A URL needs a scheme, a host and a path
pub fn is_valid_url(item: &str) -> bool {
    let url = match Url::parse(item) {
        Ok(url) => url,
        Err(_) => return false,
    };

    let has_host = url.host_str().map_or(false, |host| !host.is_empty());

    // Url normalizes a missing path to "/", so check the raw text after the authority
    let has_path = item
        .split_once("://")
        .and_then(|(_, rest)| rest.split(|c: char| c == '?' || c == '#').next())
        .map_or(false, |authority_and_path| authority_and_path.contains('/'));

    has_host && has_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, b"img").unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("http://files.example.com/images/4.jpg"));
        assert!(is_valid_url("https://example.com/"));
        assert!(!is_valid_url("https://example.com"));
        assert!(!is_valid_url("example.com/a.jpg"));
        assert!(!is_valid_url("/tmp/a.jpg"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_single_classification() {
        let dir = TempDir::new().unwrap();
        let file = touch(&dir, "a.png");

        assert_eq!(Resource::new(&file).unwrap().kind(), "file");
        assert_eq!(Resource::new("https://example.com/a.png").unwrap().kind(), "url");
        assert!(matches!(
            Resource::new(dir.path().join("missing.png").to_string_lossy()),
            Err(OptimizeError::InvalidResource(_))
        ));
        // a directory is not a file
        assert!(Resource::new(dir.path().to_string_lossy()).is_err());
    }

    #[test]
    fn test_group_size_limits() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(Resource::group(empty), Err(OptimizeError::InvalidResource(_))));

        let six: Vec<String> = (1..=6).map(|i| format!("https://example.com/{}.jpg", i)).collect();
        assert!(matches!(Resource::group(&six), Err(OptimizeError::InvalidResource(_))));

        let five = &six[..5];
        let resource = Resource::group(five).unwrap();
        assert_eq!(resource.kind(), "urls");
        assert_eq!(resource.len(), 5);
    }

    #[test]
    fn test_group_of_files() {
        let dir = TempDir::new().unwrap();
        let files = vec![touch(&dir, "a.png"), touch(&dir, "b.jpg")];

        let resource = Resource::group(&files).unwrap();
        assert_eq!(resource.kind(), "files");
        assert!(resource.requires_upload());
    }

    #[test]
    fn test_mixed_group_is_rejected() {
        let dir = TempDir::new().unwrap();
        let items = vec![touch(&dir, "a.png"), "https://example.com/b.jpg".to_string()];

        assert!(matches!(Resource::group(&items), Err(OptimizeError::InvalidResource(_))));
    }

    #[test]
    fn test_from_items() {
        let one = vec!["https://example.com/a.jpg".to_string()];
        assert_eq!(Resource::from_items(&one).unwrap().kind(), "url");

        let two = vec![
            "https://example.com/a.jpg".to_string(),
            "https://example.com/b.jpg".to_string(),
        ];
        assert_eq!(Resource::from_items(&two).unwrap().kind(), "urls");
    }
}
