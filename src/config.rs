use crate::constants::{DOCUMENT_ENDPOINT_PAGE_SIZE, HTTP_REQUEST_TIMEOUT_SECS};
use crate::error::AppError;
use crate::types::{Identifier, PageSize, ValidationError};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable consulted when `--backend-url` is not given.
pub const BACKEND_URL_ENV: &str = "DOCBATCH_BACKEND_URL";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Identifiers of the documents to fetch
    #[arg(required = true)]
    pub identifiers: Vec<String>,

    /// Base URL of the document backend (falls back to $DOCBATCH_BACKEND_URL)
    #[arg(short = 'u', long)]
    pub backend_url: Option<String>,

    /// Maximum identifiers per request
    #[arg(long, default_value_t = DOCUMENT_ENDPOINT_PAGE_SIZE)]
    pub page_size: usize,

    /// Timeout for a single request, in seconds
    #[arg(long, default_value_t = HTTP_REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Write the fetched documents to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Validated configuration for one orchestration run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// `None` means no backend is reachable; orchestrations then fetch nothing.
    pub backend_url: Option<Url>,
    pub page_size: PageSize,
    pub request_timeout: Duration,
    pub identifiers: Vec<Identifier>,
    pub output_file: Option<PathBuf>,
    pub verbose: bool,
}

impl FetchConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let raw_url = cli
            .backend_url
            .or_else(|| std::env::var(BACKEND_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty());
        let backend_url = raw_url.as_deref().map(parse_backend_url).transpose()?;

        let identifiers = cli
            .identifiers
            .into_iter()
            .map(Identifier::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FetchConfig {
            backend_url,
            page_size: PageSize::new(cli.page_size)?,
            request_timeout: Duration::from_secs(cli.timeout_secs),
            identifiers,
            output_file: cli.output.map(PathBuf::from),
            verbose: cli.verbose,
        })
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            page_size: PageSize::default(),
            request_timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
            identifiers: Vec::new(),
            output_file: None,
            verbose: false,
        }
    }
}

/// Parses a backend base URL, accepting only http(s).
pub fn parse_backend_url(input: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(input.trim()).map_err(|e| ValidationError::InvalidUrl {
        url: input.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ValidationError::InvalidUrl {
            url: input.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
