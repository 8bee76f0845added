//! # Directory Scanner Module
//!
//! Questo modulo gestisce la discovery delle immagini ancora da ottimizzare.
//!
//! ## Responsabilità:
//! - Discovery di immagini in una directory (solo figli diretti o ricorsiva)
//! - Esclusione di sottoalberi indicati dall'utente
//! - I symlink vengono seguiti; una directory con ledger illeggibile viene saltata
//! - Filtro dei file già registrati nel ledger di ogni directory toccata
//! - Utilità per formattazione human-readable delle dimensioni
//!
//! ## Formati supportati:
//! - JPG, JPEG, PNG, GIF (estensione case-insensitive)
//!
//! ## Ordine:
//! L'ordine è deterministico: le entry di ogni directory sono ordinate per nome.
//!
//! ## Esempio:
//! ```rust,ignore
//! let pending = Scanner::scan(&CsvLedger::new(), Path::new("/img"), true, &[])?;
//! ```

use crate::{error::Result, ledger::LedgerStore};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Finds images that still need optimizing
pub struct Scanner;

impl Scanner {
    /// Eligible images under `directory`, minus everything already in a ledger
    pub fn scan<L: LedgerStore + ?Sized>(
        ledger: &L,
        directory: &Path,
        recursive: bool,
        exclude: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let files = Self::find_images(directory, recursive, exclude);

        let parents: BTreeSet<&Path> = files.iter().filter_map(|f| f.parent()).collect();

        let mut recorded: HashSet<String> = HashSet::new();
        let mut unreadable: HashSet<PathBuf> = HashSet::new();
        for parent in parents {
            match ledger.recorded_paths(parent) {
                Ok(paths) => recorded.extend(paths),
                Err(e) => {
                    warn!(
                        "Unreadable ledger in {}, skipping its images: {}",
                        parent.display(),
                        e
                    );
                    unreadable.insert(parent.to_path_buf());
                }
            }
        }

        let total = files.len();
        let pending: Vec<PathBuf> = files
            .into_iter()
            .filter(|f| f.parent().map_or(true, |p| !unreadable.contains(p)))
            .filter(|f| !recorded.contains(&*f.to_string_lossy()))
            .collect();

        debug!(
            "Found {} images in {}, {} already optimized",
            total,
            directory.display(),
            total - pending.len()
        );

        Ok(pending)
    }

    /// All supported images, direct children only unless `recursive`
    pub fn find_images(directory: &Path, recursive: bool, exclude: &[PathBuf]) -> Vec<PathBuf> {
        let max_depth = if recursive { usize::MAX } else { 1 };

        WalkDir::new(directory)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !Self::is_excluded(entry, exclude))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(DirEntry::into_path)
            .filter(|path| Self::is_supported_format(path))
            .collect()
    }

    fn is_excluded(entry: &DirEntry, exclude: &[PathBuf]) -> bool {
        entry.file_type().is_dir() && exclude.iter().any(|ex| entry.path().starts_with(ex))
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "jpg" | "jpeg" | "png" | "gif")
        } else {
            false
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
