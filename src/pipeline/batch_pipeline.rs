//! # Batch Pipeline Orchestrator
//!
//! Orchestratore del batch run: scan → submit → download → ledger → statistiche.
//!
//! ## Flusso per ogni run:
//! 1. Canonicalizza la directory e prepara la directory di output (unico errore fatale)
//! 2. Scanner: immagini non ancora presenti nei ledger
//! 3. Per ogni file: submit tramite `MegaOptimClient`, download di ogni risultato,
//!    append nel ledger della directory sorgente, aggiornamento statistiche
//! 4. Riepilogo finale in MB
//!
//! Gli errori del singolo file (submit, url mancante, download, ledger) sono
//! soft failure: loggati, contati e saltati. Il file resta fuori dal ledger
//! e verrà ritentato al run successivo.

use crate::{
    client::{HttpTransport, JobDescriptor, MegaOptimClient, ResultItem, Transport},
    config::Config,
    error::{OptimizeError, Result},
    json_output::JsonMessage,
    ledger::{CsvLedger, LedgerRecord, LedgerStore},
    options::OptimizationOptions,
    pipeline::path_resolver::PathResolver,
    progress::{ProgressManager, RunSummary},
    resource::Resource,
    scanner::Scanner,
};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Timestamp format of the ledger `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sequential batch optimizer for one directory (tree)
pub struct BatchPipeline<T: Transport = HttpTransport, L: LedgerStore = CsvLedger> {
    client: MegaOptimClient<T>,
    ledger: L,
    config: Config,
}

impl<T: Transport, L: LedgerStore> BatchPipeline<T, L> {
    pub fn new(client: MegaOptimClient<T>, ledger: L, config: Config) -> Self {
        Self {
            client,
            ledger,
            config,
        }
    }

    pub fn client(&self) -> &MegaOptimClient<T> {
        &self.client
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Optimize every not-yet-recorded image under `directory`
    pub async fn run(
        &self,
        directory: &Path,
        output_directory: Option<&Path>,
        options: &OptimizationOptions,
        recursive: bool,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        let directory = directory.canonicalize()?;

        let output_directory = output_directory
            .map(PathResolver::prepare_output_dir)
            .transpose()?;

        let exclude = self.exclusions(&directory, output_directory.as_deref());
        let files = Scanner::scan(&self.ledger, &directory, recursive, &exclude)?;

        self.emit_start_message(&directory, output_directory.as_deref(), &files, recursive);

        let mut summary = RunSummary::new();
        summary.files_found = files.len();

        if files.is_empty() {
            self.handle_empty_directory(&directory, &summary, start_time);
            return Ok(summary);
        }

        let progress = if self.config.quiet || self.config.json_output {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(files.len() as u64)
        };

        for file in &files {
            let outcome = self
                .process_file(file, output_directory.as_deref(), options)
                .await;

            let message = if outcome.failures == 0 {
                format!("✅ {}", display_name(file))
            } else {
                format!("❌ {}", display_name(file))
            };
            summary.merge(&outcome);
            progress.update(&message);
        }

        progress.finish(&summary.format_summary());
        self.print_final_stats(&directory, &summary, start_time.elapsed().as_secs_f64());

        Ok(summary)
    }

    /// Statistics for one file; never fails, errors become soft failures
    async fn process_file(
        &self,
        file: &Path,
        output_directory: Option<&Path>,
        options: &OptimizationOptions,
    ) -> RunSummary {
        let mut outcome = RunSummary::new();
        let name = display_name(file);

        let destination = match PathResolver::destination_for(file, output_directory) {
            Ok(destination) => destination,
            Err(e) => {
                self.soft_failure(file, &e, &mut outcome);
                return outcome;
            }
        };
        debug!("Target path for {}: {}", name, destination.display());

        info!("Processing file {}", name);
        let job = match self.request_optimization(file, options).await {
            Ok(job) => job,
            Err(e) => {
                self.soft_failure(file, &e, &mut outcome);
                return outcome;
            }
        };

        for item in &job.result {
            match self.store_result(file, &destination, item).await {
                Ok(record) => {
                    info!("File {} successfully optimized.", name);
                    outcome.add_optimized(record.original_size, record.saved_bytes);
                    if self.config.json_output {
                        JsonMessage::file_complete(&record).emit();
                    }
                }
                Err(e) => self.soft_failure(file, &e, &mut outcome),
            }
        }

        outcome
    }

    /// Submit one file and insist on final results
    async fn request_optimization(
        &self,
        file: &Path,
        options: &OptimizationOptions,
    ) -> Result<JobDescriptor> {
        let resource = Resource::file(file)?;
        let job = self
            .client
            .optimize(&resource, options, self.config.timeout())
            .await?;

        if !job.is_complete() {
            return Err(OptimizeError::RemoteOptimization(vec![format!(
                "service returned status {:?} with code {} instead of final results",
                job.status, job.code
            )]));
        }
        if job.result.is_empty() {
            return Err(OptimizeError::RemoteOptimization(vec![
                "service returned no results".to_string(),
            ]));
        }

        Ok(job)
    }

    /// Download one result and record it in the ledger
    async fn store_result(
        &self,
        file: &Path,
        destination: &Path,
        item: &ResultItem,
    ) -> Result<LedgerRecord> {
        let url = item
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| OptimizeError::NoDownloadUrl(display_name(file)))?;

        self.download_to(url, file, destination).await?;

        let record = LedgerRecord::from_result(
            item,
            file,
            destination,
            Local::now().format(DATE_FORMAT).to_string(),
        );
        self.ledger.append(&record)?;

        Ok(record)
    }

    /// Stream into a sibling temp file, then move it over `destination`
    async fn download_to(&self, url: &str, source: &Path, destination: &Path) -> Result<u64> {
        if destination.is_dir() {
            return Err(OptimizeError::Validation(format!(
                "Destination is a directory: {}",
                destination.display()
            )));
        }

        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let staging = tempfile::Builder::new()
            .prefix(".megaoptim-")
            .tempfile_in(parent)?
            .into_temp_path();

        let written = self.client.download(url, &staging).await?;

        // The optimized file inherits the source's permissions
        if let Ok(metadata) = std::fs::metadata(source) {
            std::fs::set_permissions(&staging, metadata.permissions())?;
        }

        staging
            .persist(destination)
            .map_err(|e| OptimizeError::Io(e.error))?;

        debug!("Saved {} bytes to {}", written, destination.display());
        Ok(written)
    }

    fn soft_failure(&self, file: &Path, error: &OptimizeError, outcome: &mut RunSummary) {
        warn!("Failed to optimize file {}: {}", display_name(file), error);
        outcome.add_failure();
        if self.config.json_output {
            JsonMessage::file_failed(file.to_path_buf(), error.to_string()).emit();
        }
    }

    /// Configured exclusions, plus the output directory when it sits inside the scanned tree
    fn exclusions(&self, directory: &Path, output_directory: Option<&Path>) -> Vec<PathBuf> {
        let mut exclude = PathResolver::normalize_exclusions(&self.config.exclude);
        if let Some(output_directory) = output_directory {
            if output_directory != directory && output_directory.starts_with(directory) {
                debug!("Excluding output directory {} from the scan", output_directory.display());
                exclude.push(output_directory.to_path_buf());
            }
        }
        exclude
    }

    fn emit_start_message(
        &self,
        directory: &Path,
        output_directory: Option<&Path>,
        files: &[PathBuf],
        recursive: bool,
    ) {
        if self.config.json_output {
            JsonMessage::start(
                directory.to_path_buf(),
                output_directory.map(Path::to_path_buf),
                files.len(),
                recursive,
            )
            .emit();
            return;
        }

        info!("Starting optimization in: {}", directory.display());
        match output_directory {
            Some(output_directory) => info!("📁 Output directory: {}", output_directory.display()),
            None => info!("📁 Mode: Replace files in place"),
        }
        debug!("Found total {} images", files.len());
    }

    fn handle_empty_directory(&self, directory: &Path, summary: &RunSummary, start_time: Instant) {
        if self.config.json_output {
            JsonMessage::complete(summary, start_time.elapsed().as_secs_f64()).emit();
        } else {
            info!("No unoptimized files found in {}", directory.display());
        }
    }

    fn print_final_stats(&self, directory: &Path, summary: &RunSummary, duration: f64) {
        if self.config.json_output {
            JsonMessage::complete(summary, duration).emit();
            return;
        }

        info!("Directory {} successfully optimized!", directory.display());
        info!("{}", summary.format_summary());
        if summary.failures > 0 {
            warn!(
                "{} file(s) failed and will be retried on the next run",
                summary.failures
            );
        }
        debug!(
            "Average reduction: {:.2}% in {:.1}s",
            summary.overall_reduction_percent(),
            duration
        );
    }
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
