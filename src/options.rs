//! # Optimization Options Module
//!
//! Parametri di ottimizzazione inviati al servizio remoto.
//!
//! ## Responsabilità:
//! - `PartialOptions`: opzioni fornite dal chiamante, ogni campo opzionale
//! - `OptimizationOptions`: opzioni complete, pronte per la richiesta
//! - `PartialOptions::resolve()`: applica i default solo ai campi assenti
//!   (un valore esplicito del chiamante non viene mai sovrascritto)
//!
//! ## Default:
//! - `compression`: intelligent
//! - `keep_exif`: 1
//! - `cmyktorgb`: 1
//! - `max_width` / `max_height`: 0 (nessun limite)

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Compression mode understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Lossy, quality level picked by the service for human vision
    #[default]
    Intelligent,
    Ultra,
    Lossless,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intelligent => "intelligent",
            Self::Ultra => "ultra",
            Self::Lossless => "lossless",
        }
    }
}

/// Caller-supplied options; `None` means "use the default"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialOptions {
    pub compression: Option<Compression>,
    pub keep_exif: Option<bool>,
    pub cmyktorgb: Option<bool>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// When set, the service posts results here and `optimize` does not poll
    pub callback_url: Option<String>,
}

impl PartialOptions {
    /// Fill every absent field with its default
    pub fn resolve(&self) -> OptimizationOptions {
        let defaults = OptimizationOptions::default();
        OptimizationOptions {
            compression: self.compression.unwrap_or(defaults.compression),
            keep_exif: self.keep_exif.unwrap_or(defaults.keep_exif),
            cmyktorgb: self.cmyktorgb.unwrap_or(defaults.cmyktorgb),
            max_width: self.max_width.unwrap_or(defaults.max_width),
            max_height: self.max_height.unwrap_or(defaults.max_height),
            callback_url: self.callback_url.clone().filter(|url| !url.trim().is_empty()),
        }
    }

    /// Overlay `other` on top of `self`: fields set in `other` win
    pub fn merge(&self, other: &PartialOptions) -> PartialOptions {
        PartialOptions {
            compression: other.compression.or(self.compression),
            keep_exif: other.keep_exif.or(self.keep_exif),
            cmyktorgb: other.cmyktorgb.or(self.cmyktorgb),
            max_width: other.max_width.or(self.max_width),
            max_height: other.max_height.or(self.max_height),
            callback_url: other.callback_url.clone().or_else(|| self.callback_url.clone()),
        }
    }
}

/// Fully resolved options for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOptions {
    pub compression: Compression,
    pub keep_exif: bool,
    pub cmyktorgb: bool,
    /// 0 = unconstrained
    pub max_width: u32,
    /// 0 = unconstrained
    pub max_height: u32,
    pub callback_url: Option<String>,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Intelligent,
            keep_exif: true,
            cmyktorgb: true,
            max_width: 0,
            max_height: 0,
            callback_url: None,
        }
    }
}

impl OptimizationOptions {
    /// Form fields in the shape the service expects (flags as "1"/"0")
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        let flag = |on: bool| if on { "1" } else { "0" }.to_string();

        let mut fields = vec![
            ("compression".to_string(), self.compression.as_str().to_string()),
            ("keep_exif".to_string(), flag(self.keep_exif)),
            ("cmyktorgb".to_string(), flag(self.cmyktorgb)),
            ("max_width".to_string(), self.max_width.to_string()),
            ("max_height".to_string(), self.max_height.to_string()),
        ];
        if let Some(ref callback_url) = self.callback_url {
            fields.push(("callback_url".to_string(), callback_url.clone()));
        }
        fields
    }

    pub fn has_callback(&self) -> bool {
        self.callback_url.is_some()
    }
}
