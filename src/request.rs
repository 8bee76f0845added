//! # Optimization Request Builder
//!
//! Unisce opzioni e risorsa in una richiesta pronta per il trasporto.
//!
//! ## Campi generati:
//! - opzioni: `compression`, `keep_exif`, `cmyktorgb`, `max_width`, `max_height` (+ `callback_url`)
//! - riferimenti: `url` oppure `url1..url5`
//! - upload: `file` oppure `file1..file5` (letti dal trasporto come stream binari)
//! - discriminatore: `type` = url | urls | file | files
//!
//! La presenza di upload forza il multipart; solo URL usa un form post standard.

use crate::{
    error::{OptimizeError, Result},
    options::OptimizationOptions,
    resource::Resource,
};
use std::path::PathBuf;

/// A local file attached to a multipart submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub field: String,
    pub path: PathBuf,
}

/// A fully assembled submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizationRequest {
    pub fields: Vec<(String, String)>,
    pub uploads: Vec<Upload>,
}

impl OptimizationRequest {
    /// An empty body, used by the result poll
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_multipart(&self) -> bool {
        !self.uploads.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
pub struct RequestBuilder {
    options: Option<OptimizationOptions>,
    resource: Option<Resource>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: OptimizationOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn build(self) -> Result<OptimizationRequest> {
        let options = self.options.ok_or_else(|| {
            OptimizeError::MissingParameter("image optimization parameters".to_string())
        })?;
        let resource = self.resource.ok_or_else(|| {
            OptimizeError::MissingParameter("a valid image path or url".to_string())
        })?;

        let mut request = OptimizationRequest {
            fields: options.to_form_fields(),
            uploads: Vec::new(),
        };

        match resource {
            Resource::Url(ref url) => {
                request.fields.push(("url".to_string(), url.clone()));
            }
            Resource::Urls(ref urls) => {
                for (i, url) in urls.iter().enumerate() {
                    request.fields.push((format!("url{}", i + 1), url.clone()));
                }
            }
            Resource::File(ref path) => {
                request.uploads.push(Upload {
                    field: "file".to_string(),
                    path: path.clone(),
                });
            }
            Resource::Files(ref paths) => {
                for (i, path) in paths.iter().enumerate() {
                    request.uploads.push(Upload {
                        field: format!("file{}", i + 1),
                        path: path.clone(),
                    });
                }
            }
        }

        request.fields.push(("type".to_string(), resource.kind().to_string()));

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Compression;

    #[test]
    fn test_missing_parameters() {
        let no_options = RequestBuilder::new()
            .resource(Resource::Url("https://example.com/a.jpg".to_string()))
            .build();
        assert!(matches!(no_options, Err(OptimizeError::MissingParameter(_))));

        let no_resource = RequestBuilder::new()
            .options(OptimizationOptions::default())
            .build();
        assert!(matches!(no_resource, Err(OptimizeError::MissingParameter(_))));
    }

    #[test]
    fn test_url_group_fields() {
        let request = RequestBuilder::new()
            .options(OptimizationOptions {
                compression: Compression::Ultra,
                ..Default::default()
            })
            .resource(Resource::Urls(vec![
                "https://example.com/4.jpg".to_string(),
                "https://example.com/5.jpg".to_string(),
            ]))
            .build()
            .unwrap();

        assert!(!request.is_multipart());
        assert_eq!(request.field("type"), Some("urls"));
        assert_eq!(request.field("url1"), Some("https://example.com/4.jpg"));
        assert_eq!(request.field("url2"), Some("https://example.com/5.jpg"));
        assert_eq!(request.field("url"), None);
        assert_eq!(request.field("compression"), Some("ultra"));
    }

    #[test]
    fn test_single_file_upload() {
        let request = RequestBuilder::new()
            .options(OptimizationOptions::default())
            .resource(Resource::File(PathBuf::from("/img/a.png")))
            .build()
            .unwrap();

        assert!(request.is_multipart());
        assert_eq!(request.field("type"), Some("file"));
        assert_eq!(
            request.uploads,
            vec![Upload {
                field: "file".to_string(),
                path: PathBuf::from("/img/a.png"),
            }]
        );
    }

    #[test]
    fn test_file_group_numbering() {
        let request = RequestBuilder::new()
            .options(OptimizationOptions::default())
            .resource(Resource::Files(vec![
                PathBuf::from("/img/a.png"),
                PathBuf::from("/img/b.png"),
                PathBuf::from("/img/c.png"),
            ]))
            .build()
            .unwrap();

        let names: Vec<&str> = request.uploads.iter().map(|u| u.field.as_str()).collect();
        assert_eq!(names, vec!["file1", "file2", "file3"]);
        assert_eq!(request.field("type"), Some("files"));
    }
}
