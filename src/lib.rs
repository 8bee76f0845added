//! # MegaOptim Client Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per diverse operazioni
//! - `options`: Opzioni di ottimizzazione e relativi default
//! - `resource`: Classificazione delle risorse (URL, file, gruppi)
//! - `request`: Costruzione del payload per il servizio
//! - `client`: Client HTTP per l'API remota (submit, poll, download)
//! - `ledger`: Tracking file già ottimizzati, un ledger per directory
//! - `scanner`: Discovery delle immagini non ancora ottimizzate
//! - `pipeline`: Orchestratore del batch run
//! - `progress`: Progress tracking e statistiche
//! - `json_output`: Output JSON per uso programmatico
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use megaoptim::{BatchPipeline, Config, CsvLedger, MegaOptimClient};
//!
//! let client = MegaOptimClient::new("API_KEY")?;
//! let pipeline = BatchPipeline::new(client, CsvLedger::new(), Config::default());
//! let summary = pipeline.run(&path, None, &Default::default(), false).await?;
//! println!("{}", summary.format_summary());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod json_output;
pub mod ledger;
pub mod options;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod resource;
pub mod scanner;

pub use client::{HttpTransport, JobDescriptor, JobStatus, MegaOptimClient, ResultItem, Transport};
pub use config::Config;
pub use error::{OptimizeError, Result};
pub use ledger::{CsvLedger, LedgerRecord, LedgerStore};
pub use options::{Compression, OptimizationOptions, PartialOptions};
pub use pipeline::BatchPipeline;
pub use progress::RunSummary;
pub use resource::Resource;
pub use scanner::Scanner;
