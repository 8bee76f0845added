//! # MegaOptim CLI - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente (API key, directory)
//! - Creazione della configurazione e avvio del batch o della modalità risorsa
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI
//! 2. Costruisce la Config: default → `--config` → flag espliciti
//! 3. Configura il logging (DEBUG / INFO / ERROR, `RUST_LOG` ha la precedenza)
//! 4. Verifica API key e directory (uscita anticipata con messaggio)
//! 5. Avvia `BatchPipeline` sulla directory, oppure ottimizza le `--resource` date
//!
//! ## Esempio di utilizzo:
//! ```bash
//! megaoptim --api-key KEY --dir ./photos --outdir ./optimized --compression ultra -r
//! megaoptim --api-key KEY --resource https://example.com/a.png --resource https://example.com/b.png
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use megaoptim::{
    json_output::JsonMessage, scanner::Scanner, BatchPipeline, Compression, Config, CsvLedger,
    HttpTransport, MegaOptimClient, PartialOptions, Resource,
};

#[derive(Parser)]
#[command(name = "megaoptim")]
#[command(version)]
#[command(about = "Optimize images with the MegaOptim.com API, skipping files already done")]
struct Args {
    /// MegaOptim.com API key
    #[arg(long, env = "MEGAOPTIM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory containing the images to optimize
    #[arg(long, required_unless_present = "resource")]
    dir: Option<PathBuf>,

    /// Output directory for optimized files (if not specified, replace originals in place)
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Compression level
    #[arg(long, value_enum)]
    compression: Option<Compression>,

    /// Keep EXIF data (1 or 0)
    #[arg(long, value_parser = parse_flag)]
    keep_exif: Option<bool>,

    /// Convert CMYK images to RGB (1 or 0)
    #[arg(long, value_parser = parse_flag)]
    cmyktorgb: Option<bool>,

    /// Maximum width in pixels (0 = unconstrained)
    #[arg(long)]
    max_width: Option<u32>,

    /// Maximum height in pixels (0 = unconstrained)
    #[arg(long)]
    max_height: Option<u32>,

    /// Let the service post results to this url instead of waiting for them
    #[arg(long)]
    callback_url: Option<String>,

    /// Comma separated directories to skip while scanning
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<PathBuf>,

    /// Scan subdirectories too
    #[arg(short, long)]
    recursive: bool,

    /// Seconds the service may take to finish a queued job
    #[arg(long)]
    timeout: Option<u64>,

    /// Optimize these images or urls directly (up to 5), without scanning or ledger
    #[arg(long, conflicts_with = "dir")]
    resource: Vec<String>,

    /// Load settings from a JSON file; flags given here take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base url of the optimization API
    #[arg(long)]
    api_url: Option<String>,

    /// Output progress and results as JSON lines for programmatic use
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report fatal errors
    #[arg(short, long)]
    quiet: bool,
}

/// Accepts 1/0, true/false, yes/no, on/off
fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected 1 or 0, got '{}'", other)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match build_config(&args).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("Error: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if config.json_output {
                JsonMessage::error(e.to_string(), Some(format!("{:?}", e))).emit();
            } else if config.verbose {
                error!("{:?}", e);
            } else {
                error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// Defaults, then the optional config file, then explicit flags
async fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };

    if let Some(api_key) = &args.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(api_url) = &args.api_url {
        config.api_base_url = api_url.clone();
    }
    if let Some(outdir) = &args.outdir {
        config.output_path = Some(outdir.clone());
    }
    if !args.exclude.is_empty() {
        config.exclude = args.exclude.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    config.recursive |= args.recursive;
    config.verbose |= args.verbose;
    config.quiet |= args.quiet;
    config.json_output |= args.json;

    config.options = config.options.merge(&PartialOptions {
        compression: args.compression,
        keep_exif: args.keep_exif,
        cmyktorgb: args.cmyktorgb,
        max_width: args.max_width,
        max_height: args.max_height,
        callback_url: args.callback_url.clone(),
    });

    config.validate()?;
    Ok(config)
}

fn init_logging(config: &Config) -> Result<()> {
    let level = if config.verbose {
        "debug"
    } else if config.quiet {
        "error"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let api_key = config.require_api_key()?;
    let client = MegaOptimClient::with_transport(HttpTransport::new(api_key)?, &config.api_base_url);
    let options = config.options.resolve();

    if !args.resource.is_empty() {
        let resource = Resource::from_items(&args.resource)?;
        debug!("Optimizing {} resource(s) of type '{}'", resource.len(), resource.kind());

        let job = client.optimize(&resource, &options, config.timeout()).await?;

        if config.json_output {
            JsonMessage::result(job).emit();
            return Ok(());
        }

        if !job.is_complete() {
            info!(
                "Job {} accepted, results will be posted to the callback url",
                job.process_id.as_deref().unwrap_or("-")
            );
            return Ok(());
        }

        for item in &job.result {
            match &item.url {
                Some(url) => info!(
                    "{}: {} -> {} ({:.2}% saved) {}",
                    item.file_name,
                    Scanner::format_size(item.original_size),
                    Scanner::format_size(item.optimized_size),
                    item.saved_percent,
                    url
                ),
                None => warn!("{}: optimization failed", item.file_name),
            }
        }
        return Ok(());
    }

    let directory = args
        .dir
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Please provide a target directory (--dir)"))?;

    if !directory.is_dir() {
        return Err(anyhow::anyhow!(
            "Target directory does not exist: {}",
            directory.display()
        ));
    }

    if options.has_callback() {
        warn!("A callback url is set: queued files are reported as failures and retried next run");
    }

    let pipeline = BatchPipeline::new(client, CsvLedger::new(), config.clone());
    pipeline
        .run(
            directory,
            config.output_path.as_deref(),
            &options,
            config.recursive,
        )
        .await?;

    Ok(())
}
