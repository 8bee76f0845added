//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di un batch run.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Tracking statistiche (file ottimizzati, fallimenti, byte originali e risparmiati)
//! - Report finale in MB arrotondati a 2 decimali
//!
//! ## Statistiche tracciate:
//! - **files_found**: file non ancora ottimizzati trovati dallo scanner
//! - **files_optimized**: file scaricati e registrati nel ledger
//! - **failures**: soft failure (submit, url mancante, download, ledger)
//! - **total_original_size**: dimensione totale dei file originali
//! - **total_bytes_saved**: byte risparmiati; un `saved_bytes <= 0` contribuisce 0
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================================] 2/2 (100%) ✅ b.jpg
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Manages progress reporting for a batch run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that draws nothing (quiet and JSON modes)
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics of one batch run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub files_found: usize,
    pub files_optimized: usize,
    pub failures: usize,
    pub total_original_size: u64,
    pub total_bytes_saved: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a success; non-positive savings contribute nothing
    pub fn add_optimized(&mut self, original_size: u64, saved_bytes: i64) {
        self.files_optimized += 1;
        self.total_original_size += original_size;
        if saved_bytes > 0 {
            self.total_bytes_saved += saved_bytes as u64;
        }
    }

    pub fn add_failure(&mut self) {
        self.failures += 1;
    }

    /// Fold another partial summary into this one
    pub fn merge(&mut self, other: &RunSummary) {
        self.files_found += other.files_found;
        self.files_optimized += other.files_optimized;
        self.failures += other.failures;
        self.total_original_size += other.total_original_size;
        self.total_bytes_saved += other.total_bytes_saved;
    }

    pub fn original_size_mb(&self) -> f64 {
        megabytes(self.total_original_size)
    }

    pub fn saved_mb(&self) -> f64 {
        megabytes(self.total_bytes_saved)
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        if self.total_original_size > 0 {
            (self.total_bytes_saved as f64 / self.total_original_size as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Total files count: {} ({:.2} MB). Total space saved: {:.2} MB",
            self.files_optimized,
            self.original_size_mb(),
            self.saved_mb()
        )
    }
}

/// Bytes to MB, rounded to 2 decimals
pub fn megabytes(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}
