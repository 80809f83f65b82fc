use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::{CHECKPOINT_EVERY, CHECKPOINT_FILE, SITE_URL};

/// Scrape critic reviews for every movie in a catalog file.
#[derive(Parser, Debug)]
#[command(name = "fetch-reviews", version)]
pub struct FetchArgs {
    /// Movie catalog: `movieId,title (year),genres` with a header row.
    pub input_file: PathBuf,
    /// Tab-separated output, one row per reviewer and movie.
    pub output_file: PathBuf,
    /// Where to write skipped catalog rows and failed movies.
    pub error_file: Option<PathBuf>,

    /// Checkpoint file for in-progress results.
    #[arg(long, env = "FETCH_REVIEWS_CHECKPOINT", default_value = CHECKPOINT_FILE)]
    pub checkpoint: PathBuf,
    /// Write the checkpoint after every N processed movies.
    #[arg(long, env = "FETCH_REVIEWS_CHECKPOINT_EVERY", default_value_t = CHECKPOINT_EVERY,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub checkpoint_every: u32,
    /// Load the checkpoint first and skip movies it already holds.
    #[arg(long, env = "FETCH_REVIEWS_RESUME")]
    pub resume: bool,
    /// Per-request timeout in seconds. No timeout when unset.
    #[arg(long, env = "FETCH_REVIEWS_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
    /// Base URL of the review site.
    #[arg(long, env = "FETCH_REVIEWS_SITE_URL", default_value = SITE_URL)]
    pub site_url: String,
}

/// Pivot scraped reviews into a reviewer by movie score matrix.
#[derive(Parser, Debug)]
#[command(name = "parse-results", version)]
pub struct ParseArgs {
    /// Tab-separated output of `fetch-reviews`.
    pub reviews_file: PathBuf,
    /// Tab-separated matrix: one row per reviewer, one column per movie.
    pub output_file: PathBuf,
}

/// Settings for one scrape run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    pub site_url: String,
    pub checkpoint_path: PathBuf,
    pub checkpoint_every: usize,
    pub resume: bool,
    pub timeout: Option<Duration>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            site_url: SITE_URL.to_string(),
            checkpoint_path: PathBuf::from(CHECKPOINT_FILE),
            checkpoint_every: CHECKPOINT_EVERY as usize,
            resume: false,
            timeout: None,
        }
    }
}

impl From<&FetchArgs> for ScrapeConfig {
    fn from(args: &FetchArgs) -> Self {
        Self {
            site_url: args.site_url.clone(),
            checkpoint_path: args.checkpoint.clone(),
            checkpoint_every: args.checkpoint_every as usize,
            resume: args.resume,
            timeout: args.timeout_secs.map(Duration::from_secs),
        }
    }
}
