// src/main.rs

use anyhow::{Context, Result, bail};
use bl_extract::heuristics::extract_bl_with;
use bl_extract::media::media_type_for_extension;
use bl_extract::ocr::TesseractCli;
use bl_extract::{Config, Pipeline};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bl-extract", version, about = "Extract shipment data from Bill of Lading documents")]
struct Cli {
    /// TOML config file; built-in defaults when absent.
    #[arg(long, global = true, env = "BL_EXTRACT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run acquisition and extraction on a PDF or image.
    Scan {
        file: PathBuf,

        /// Declared media type; guessed from the file extension otherwise.
        #[arg(long)]
        media_type: Option<String>,

        #[arg(long, default_value_t = 120)]
        timeout_secs: u64,

        /// Also print the transcript.
        #[arg(long)]
        raw: bool,
    },
    /// Run field extraction only, on an existing text transcript.
    Parse { text_file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Command::Scan {
            file,
            media_type,
            timeout_secs,
            raw,
        } => scan(&cfg, &file, media_type, Duration::from_secs(timeout_secs), raw).await,
        Command::Parse { text_file } => {
            let text = std::fs::read_to_string(&text_file)
                .with_context(|| format!("reading {}", text_file.display()))?;
            let data = extract_bl_with(&text, &cfg.extraction);
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
    }
}

async fn scan(cfg: &Config, file: &Path, media_type: Option<String>, timeout: Duration, raw: bool) -> Result<()> {
    let media_type = match media_type {
        Some(mt) => mt,
        None => {
            let ext = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
            match media_type_for_extension(ext) {
                Some(mt) => mt.to_string(),
                None => bail!("cannot infer media type of {}; pass --media-type", file.display()),
            }
        }
    };

    if !TesseractCli::new(&cfg.ocr).is_available() {
        warn!(tesseract = %cfg.ocr.tesseract_path, "Tesseract not found; scanned documents will fail");
    }

    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    info!(file = %file.display(), media_type = %media_type, bytes = bytes.len(), "Scanning");

    let pipeline = Arc::new(Pipeline::from_config(cfg));
    let outcome = pipeline.run_with_timeout(bytes, media_type, timeout).await;

    if raw {
        println!("{}", outcome.raw_text);
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
