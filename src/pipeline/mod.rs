//! # Pipeline Module
//!
//! Il batch run separato in sottomoduli:
//! - `batch_pipeline`: Orchestratore scan → submit → download → ledger
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_pipeline;
pub mod path_resolver;

pub use batch_pipeline::{BatchPipeline, DATE_FORMAT};
pub use path_resolver::PathResolver;
