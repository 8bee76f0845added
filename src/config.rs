//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione (e il contesto) di un run.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri del client e del batch
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `api_key`: API key MegaOptim (obbligatoria per chiamare il servizio)
//! - `api_base_url`: endpoint base (default: `https://api.megaoptim.com/v1/`)
//! - `output_path`: directory di output (default: None = sovrascrive gli originali)
//! - `recursive`: scansione ricorsiva delle sottodirectory (default: false)
//! - `exclude`: directory da escludere dalla scansione
//! - `timeout_secs`: attesa massima lato server per il risultato (default: 300)
//! - `options`: opzioni di ottimizzazione, i campi assenti prendono i default
//! - `verbose` / `quiet` / `json_output`: controllo dell'output
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     api_key: Some("KEY".to_string()),
//!     recursive: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::{client::DEFAULT_BASE_URL, options::PartialOptions};
use anyhow::Result;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration and output context for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MegaOptim API key
    pub api_key: Option<String>,
    /// Base URL of the optimization API
    pub api_base_url: String,
    /// Output directory for optimized files (None = replace in place)
    pub output_path: Option<PathBuf>,
    /// Scan subdirectories too
    pub recursive: bool,
    /// Directories whose subtrees are never scanned
    pub exclude: Vec<PathBuf>,
    /// Upper bound the service waits for a queued job, in seconds
    pub timeout_secs: u64,
    /// Optimization options; absent fields get the defaults
    pub options: PartialOptions,
    /// Verbose logging
    pub verbose: bool,
    /// Suppress everything but fatal errors
    pub quiet: bool,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            output_path: None,
            recursive: false,
            exclude: Vec::new(),
            timeout_secs: 300,
            options: PartialOptions::default(),
            verbose: false,
            quiet: false,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.verbose && self.quiet {
            return Err(anyhow::anyhow!("Verbose and quiet modes are mutually exclusive"));
        }

        if self.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0 seconds"));
        }

        Url::parse(&self.api_base_url)
            .map_err(|e| anyhow::anyhow!("Invalid API base url '{}': {}", self.api_base_url, e))?;

        Ok(())
    }

    /// The API key, or a user-facing error when it is missing
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Please provide MegaOptim.com API key (--api-key or MEGAOPTIM_API_KEY)"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
