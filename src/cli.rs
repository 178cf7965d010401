use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config;

#[derive(Parser, Debug)]
#[command(
    name = "solarplan",
    version,
    about = "County planning document pipeline: OCR, staging, and LLM extraction"
)]
pub struct Cli {
    /// Path to the staging database (default: ~/solarplan/ocr_data.db,
    /// or SOLARPLAN_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register PDFs and text files from a directory into the staging database
    Ingest {
        /// Directory scanned recursively for documents
        input_dir: PathBuf,
    },
    /// Extract text from pending documents
    Extract {
        /// Enable the vision OCR fallback for scanned documents
        /// (requires GEMINI_API_KEY and a PDFium library)
        #[arg(long)]
        ocr: bool,
    },
    /// Offline heuristic screening: flag candidate pages, scrape fields
    Screen,
    /// Route and analyze extracted documents with Gemini
    Analyze {
        /// Analyze at most this many documents
        #[arg(long)]
        limit: Option<u32>,
        /// Seconds to wait between API calls
        #[arg(long, default_value_t = config::DEFAULT_THROTTLE_SECS)]
        throttle_secs: u64,
    },
    /// Export analysis records (CSV) and screening snippets (JSONL)
    Export {
        /// Output CSV path for completed records
        #[arg(long)]
        out_csv: PathBuf,
        /// Optional output JSONL path for audit snippets
        #[arg(long)]
        out_snippets: Option<PathBuf>,
    },
    /// Show per-stage document counts
    Status,
}
