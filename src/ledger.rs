//! # Ledger Module
//!
//! Questo modulo tiene traccia dei file già ottimizzati per evitare rielaborazioni.
//!
//! ## Responsabilità:
//! - Un ledger per directory, in `<dir>/.megaoptim`
//! - Lettura dei path già registrati (`old_path`) per il filtro dello scanner
//! - Append di un record per ogni file ottimizzato con successo
//!
//! ## Strategia di persistence:
//! - Formato CSV, header scritto solo alla creazione del file
//! - Append-only: il file non viene mai riscritto né compattato
//! - Lo schema è fissato dal primo record scritto (i campi di `LedgerRecord`)
//!
//! ## Esempio di ledger:
//! ```text
//! success,file_name,original_size,optimized_size,saved_bytes,saved_percent,url,old_path,optimized_path,date
//! true,a.png,2097152,1048576,1048576,50.0,https://...,/img/a.png,/img/a.png,2026-10-16 10:00:00
//! ```
//!
//! Lo storage è dietro il trait `LedgerStore`, così scanner e pipeline non
//! dipendono dal formato su disco.

use crate::{client::ResultItem, error::Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Hidden ledger file kept in every processed directory
pub const LEDGER_FILE_NAME: &str = ".megaoptim";

/// Column used as the ledger key
const KEY_COLUMN: &str = "old_path";

/// One optimized source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub success: bool,
    pub file_name: String,
    pub original_size: u64,
    pub optimized_size: u64,
    pub saved_bytes: i64,
    pub saved_percent: f64,
    pub url: Option<String>,
    pub old_path: String,
    pub optimized_path: String,
    pub date: String,
}

impl LedgerRecord {
    /// Enrich a service result with where it came from and where it went
    pub fn from_result(item: &ResultItem, old_path: &Path, optimized_path: &Path, date: String) -> Self {
        Self {
            success: item.success,
            file_name: item.file_name.clone(),
            original_size: item.original_size,
            optimized_size: item.optimized_size,
            saved_bytes: item.saved_bytes,
            saved_percent: item.saved_percent,
            url: item.url.clone(),
            old_path: old_path.to_string_lossy().to_string(),
            optimized_path: optimized_path.to_string_lossy().to_string(),
            date,
        }
    }

    /// The directory whose ledger owns this record
    pub fn directory(&self) -> PathBuf {
        Path::new(&self.old_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Durable record of already optimized files, one ledger per directory
pub trait LedgerStore: Send + Sync {
    /// Paths recorded for `directory`; empty when no ledger exists
    fn recorded_paths(&self, directory: &Path) -> Result<HashSet<String>>;

    /// Append `record` to the ledger of its source directory
    fn append(&self, record: &LedgerRecord) -> Result<()>;
}

/// CSV ledger at `<dir>/.megaoptim`
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvLedger;

impl CsvLedger {
    pub fn new() -> Self {
        Self
    }

    pub fn ledger_path(directory: &Path) -> PathBuf {
        directory.join(LEDGER_FILE_NAME)
    }
}

impl LedgerStore for CsvLedger {
    fn recorded_paths(&self, directory: &Path) -> Result<HashSet<String>> {
        let path = Self::ledger_path(directory);
        let mut recorded = HashSet::new();

        if !path.is_file() {
            return Ok(recorded);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;

        let key_index = match reader.headers()?.iter().position(|h| h == KEY_COLUMN) {
            Some(index) => index,
            None => {
                warn!("Ledger {} has no '{}' column, ignoring it", path.display(), KEY_COLUMN);
                return Ok(recorded);
            }
        };

        for row in reader.records() {
            match row {
                Ok(row) => {
                    if let Some(old_path) = row.get(key_index).filter(|p| !p.is_empty()) {
                        recorded.insert(old_path.to_string());
                    }
                }
                Err(e) => warn!("Skipping malformed row in {}: {}", path.display(), e),
            }
        }

        debug!("Ledger {} lists {} optimized files", path.display(), recorded.len());
        Ok(recorded)
    }

    fn append(&self, record: &LedgerRecord) -> Result<()> {
        let path = Self::ledger_path(&record.directory());

        // Header only when the ledger is created
        let first_time = std::fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(first_time)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        debug!("Recorded {} in {}", record.old_path, path.display());
        Ok(())
    }
}
