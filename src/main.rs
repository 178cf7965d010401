use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use solarplan::cli::{Cli, Commands};
use solarplan::config;
use solarplan::db::{self, DatabaseError};
use solarplan::export::{self, ExportError};
use solarplan::pipeline::analysis::{AnalysisError, GeminiClient};
use solarplan::pipeline::extraction::{
    DocumentExtractor, ExtractionError, GeminiVisionOcr, OcrPipeline, PdfTextExtractor,
    PdfiumRenderer,
};
use solarplan::pipeline::ingest::{self, IngestError};
use solarplan::pipeline::runner;

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = cli.db.unwrap_or_else(config::database_path);
    let conn = db::sqlite::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "{} v{}", config::APP_NAME, config::APP_VERSION);

    match cli.command {
        Commands::Ingest { input_dir } => {
            let report = ingest::ingest_directory(&conn, &input_dir)?;
            println!(
                "Scanned {} files: {} registered, {} duplicates, {} unsupported, {} failed.",
                report.scanned,
                report.registered,
                report.duplicates,
                report.unsupported,
                report.failed
            );
        }

        Commands::Extract { ocr } => {
            let mut extractor = DocumentExtractor::new(Box::new(PdfTextExtractor));
            if ocr {
                let client = Arc::new(GeminiClient::from_env()?);
                let renderer = PdfiumRenderer::new()?;
                let engine = GeminiVisionOcr::new(client, config::VISION_MODEL);
                extractor = extractor
                    .with_ocr(OcrPipeline::new(Box::new(renderer), Box::new(engine)));
            }
            let report = runner::run_extraction(&conn, &extractor)?;
            println!(
                "Extracted {} of {} documents ({} failed).",
                report.succeeded, report.processed, report.failed
            );
        }

        Commands::Screen => {
            let report = runner::run_screening(&conn)?;
            println!(
                "Screened {} documents: {} with candidate pages, {} without.",
                report.processed, report.succeeded, report.skipped
            );
        }

        Commands::Analyze {
            limit,
            throttle_secs,
        } => {
            let client = GeminiClient::from_env()?;
            let report = runner::run_analysis(
                &conn,
                &client,
                Duration::from_secs(throttle_secs),
                limit,
            )?;
            println!(
                "Analyzed {} documents: {} extracted, {} irrelevant, {} errors.",
                report.processed, report.succeeded, report.skipped, report.failed
            );
        }

        Commands::Export {
            out_csv,
            out_snippets,
        } => {
            let rows = export::write_records_csv(&conn, &out_csv)?;
            println!("Wrote {} records to {}", rows, out_csv.display());
            if let Some(snippets_path) = out_snippets {
                let lines = export::write_snippets_jsonl(&conn, &snippets_path)?;
                println!("Snippets written to {} ({lines} lines)", snippets_path.display());
            }
        }

        Commands::Status => {
            let counts = db::repository::status_counts(&conn)?;
            println!("Documents staged: {}", counts.total);
            println!("  pending extraction: {}", counts.pending);
            println!("  extracted:          {}", counts.ocr_complete);
            println!("  extraction errors:  {}", counts.ocr_error);
            println!("  analyzed:           {}", counts.analyzed);
            println!("  irrelevant:         {}", counts.irrelevant);
            println!("  analysis errors:    {}", counts.analysis_error);
        }
    }

    Ok(())
}
