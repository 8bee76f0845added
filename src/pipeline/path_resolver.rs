//! # Path Resolution Module
//!
//! Centralizza la logica dei path del batch: destinazione di ogni file,
//! preparazione della directory di output e normalizzazione delle esclusioni.

use crate::error::{OptimizeError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// `<output_dir>/<basename>` when an output directory is set, the input itself otherwise
    pub fn destination_for(input_path: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
        match output_dir {
            Some(output_dir) => {
                let file_name = input_path.file_name().ok_or_else(|| {
                    OptimizeError::Validation(format!("Invalid file name: {}", input_path.display()))
                })?;
                Ok(output_dir.join(file_name))
            }
            None => Ok(input_path.to_path_buf()),
        }
    }

    /// Create the output directory if needed and make sure we can write into it
    pub fn prepare_output_dir(output_dir: &Path) -> Result<PathBuf> {
        Self::prepare_output_dir_with(output_dir, |dir| tempfile::tempfile_in(dir).map(drop))
    }

    /// Same as `prepare_output_dir`, with the write check supplied by the caller
    fn prepare_output_dir_with<F>(output_dir: &Path, write_probe: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> std::io::Result<()>,
    {
        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
            info!("Created output directory: {}", output_dir.display());
        }

        if !output_dir.is_dir() {
            return Err(OptimizeError::Validation(format!(
                "Output path is not a directory: {}",
                output_dir.display()
            )));
        }

        debug!("Checking if the target directory {} is writable...", output_dir.display());
        if let Err(e) = write_probe(output_dir) {
            debug!("Write probe in {} failed: {}", output_dir.display(), e);
            return Err(OptimizeError::DirectoryNotWritable(output_dir.to_path_buf()));
        }

        Ok(output_dir.canonicalize()?)
    }

    /// Canonicalize exclusions that exist; keep the rest as given
    pub fn normalize_exclusions(exclude: &[PathBuf]) -> Vec<PathBuf> {
        exclude
            .iter()
            .map(|path| path.canonicalize().unwrap_or_else(|_| path.clone()))
            .collect()
    }
}
