//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori fatali per la singola chiamata da errori fatali per il batch
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `InvalidResource`: risorsa non valida (URL/file, gruppo vuoto o > 5, gruppo misto)
//! - `MissingParameter`: opzioni, risorsa o API key mancanti
//! - `Transport`: risposta del servizio non parsabile come JSON
//! - `RemoteOptimization`: il servizio ha risposto `status=error`
//! - `Timeout`: il job non è stato completato entro il timeout
//! - `NoDownloadUrl`: un risultato senza url (soft failure nel batch)
//! - `DirectoryNotWritable`: directory di output non scrivibile (fatale per il batch)
//! - `Io` / `Http` / `Ledger`: errori delle librerie sottostanti
//! - `Validation`: errori di validazione input
//!
//! ## Esempio:
//! ```rust,ignore
//! if items.len() > MAX_GROUP_SIZE {
//!     return Err(OptimizeError::InvalidResource(format!("{} items given", items.len())));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for the MegaOptim client and batch pipeline
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Invalid resource: {0}. Resource must be an image url, a local image path, or a group of up to 5 image urls or up to 5 local image paths")]
    InvalidResource(String),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Failed to parse JSON response from MegaOptim API: {0}")]
    Transport(String),

    #[error("Remote optimization failed: {}", .0.join("; "))]
    RemoteOptimization(Vec<String>),

    #[error("Optimization timed out: {0}")]
    Timeout(String),

    #[error("No download url returned for {0}")]
    NoDownloadUrl(String),

    #[error("The save directory {} is not writable", .0.display())]
    DirectoryNotWritable(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] csv::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T, E = OptimizeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_errors_are_joined() {
        let err = OptimizeError::RemoteOptimization(vec![
            "Invalid API key".to_string(),
            "Quota exceeded".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Remote optimization failed: Invalid API key; Quota exceeded"
        );
    }

    #[test]
    fn test_not_writable_mentions_path() {
        let err = OptimizeError::DirectoryNotWritable(PathBuf::from("/srv/out"));
        assert!(err.to_string().contains("/srv/out"));
    }
}
