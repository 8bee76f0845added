//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per uso programmatico (`--json`).
//!
//! ## Responsabilità:
//! - Emette un messaggio JSON per riga su stdout
//! - Fornisce interfaccia standardizzata per comunicazione inter-processo
//!
//! ## Tipi di messaggi:
//! - `start`: inizio del batch run
//! - `file_complete`: file ottimizzato, scaricato e registrato
//! - `file_failed`: soft failure su un file
//! - `complete`: fine del batch run con statistiche finali
//! - `result`: risposta del servizio in modalità risorsa diretta
//! - `error`: errore fatale

use crate::{client::JobDescriptor, ledger::LedgerRecord, progress::RunSummary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "start")]
    Start {
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        total_files: usize,
        recursive: bool,
    },

    #[serde(rename = "file_complete")]
    FileComplete {
        path: String,
        optimized_path: String,
        original_size: u64,
        optimized_size: u64,
        saved_bytes: i64,
        saved_percent: f64,
    },

    #[serde(rename = "file_failed")]
    FileFailed { path: PathBuf, error: String },

    #[serde(rename = "complete")]
    Complete {
        files_found: usize,
        files_optimized: usize,
        failures: usize,
        total_original_size: u64,
        total_bytes_saved: u64,
        duration_seconds: f64,
    },

    #[serde(rename = "result")]
    JobResult { job: JobDescriptor },

    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(input_dir: PathBuf, output_dir: Option<PathBuf>, total_files: usize, recursive: bool) -> Self {
        Self::Start {
            input_dir,
            output_dir,
            total_files,
            recursive,
        }
    }

    pub fn file_complete(record: &LedgerRecord) -> Self {
        Self::FileComplete {
            path: record.old_path.clone(),
            optimized_path: record.optimized_path.clone(),
            original_size: record.original_size,
            optimized_size: record.optimized_size,
            saved_bytes: record.saved_bytes,
            saved_percent: record.saved_percent,
        }
    }

    pub fn file_failed(path: PathBuf, error: String) -> Self {
        Self::FileFailed { path, error }
    }

    pub fn complete(summary: &RunSummary, duration_seconds: f64) -> Self {
        Self::Complete {
            files_found: summary.files_found,
            files_optimized: summary.files_optimized,
            failures: summary.failures,
            total_original_size: summary.total_original_size,
            total_bytes_saved: summary.total_bytes_saved,
            duration_seconds,
        }
    }

    pub fn result(job: JobDescriptor) -> Self {
        Self::JobResult { job }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
