// src/main.rs

use anyhow::Context;
use clap::Parser;
use docbatch::{
    fetch_documents_and_report_error, BatchFetchOrchestrator, CommandLineInput, DocumentCollection,
    DocumentHttpClient, DocumentStore, FetchConfig, LogErrorSink, StaticIdentifiers,
};
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}";

/// Routes this crate's log output to stderr and to a log file in the temp
/// directory, returning the file's path.
///
/// Stdout carries only the JSON result. Other crates log at warn and above.
fn init_logging(verbose: bool) -> anyhow::Result<PathBuf> {
    let (console_level, console_pattern) = if verbose {
        (LevelFilter::Debug, FILE_PATTERN)
    } else {
        (LevelFilter::Warn, "{h({l})}: {m}{n}")
    };
    let log_path = std::env::temp_dir().join("docbatch.log");

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(console_pattern)))
        .build();
    let file = FileAppender::builder()
        .append(false)
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(console_level)))
                .build("console", Box::new(console)),
        )
        .appender(Appender::builder().build("file", Box::new(file)))
        .logger(Logger::builder().build("docbatch", LevelFilter::Debug))
        .build(
            Root::builder()
                .appenders(["console", "file"])
                .build(LevelFilter::Warn),
        )?;

    log4rs::init_config(config)?;
    Ok(log_path)
}

/// Fetches the configured identifiers and returns what the backend sent back.
async fn execute_fetch(config: &FetchConfig) -> anyhow::Result<DocumentCollection> {
    if config.backend_url.is_none() {
        log::warn!(
            "No backend URL given (use --backend-url or ${}); nothing will be fetched",
            docbatch::config::BACKEND_URL_ENV
        );
    }

    let client = DocumentHttpClient::new(config.request_timeout)?;
    let store = Arc::new(DocumentStore::new());
    let identifiers = Arc::new(StaticIdentifiers::new(config.identifiers.clone()));
    let orchestrator =
        BatchFetchOrchestrator::new(Arc::new(client), Arc::clone(&store), identifiers, config);

    match fetch_documents_and_report_error(&orchestrator, &LogErrorSink).await {
        Some(_) => Ok(store.documents()),
        None => {
            let reason = store
                .error()
                .map(|failure| failure.to_string())
                .unwrap_or_else(|| "unknown failure".to_string());
            anyhow::bail!("Document fetch {}: {}", store.status(), reason)
        }
    }
}

fn write_output(config: &FetchConfig, documents: &DocumentCollection) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(documents)?;
    match &config.output_file {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "✓ {} document(s) saved to {}",
                documents.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    let log_path = init_logging(cli.verbose)?;
    log::debug!("Writing log to {}", log_path.display());

    let config = FetchConfig::resolve(cli)?;

    let documents = execute_fetch(&config).await?;
    let requested = config.identifiers.iter().collect::<HashSet<_>>().len();
    if documents.len() < requested {
        log::warn!(
            "Backend returned {} of {} requested document(s)",
            documents.len(),
            requested
        );
    }

    write_output(&config, &documents)?;

    Ok(())
}
