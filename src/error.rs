use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    ParseInvalidSelector(String),
    #[error("Page is missing an expected element: {0}")]
    ParseMissingElement(&'static str),

    #[error("Malformed catalog row {line}: {reason}")]
    CatalogRow { line: usize, reason: String },
    #[error("Malformed reviews row {line}: {reason}")]
    ReviewsRow { line: usize, reason: String },

    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("URL cannot take path segments: {0}")]
    UrlNotABase(String),
    #[error("No page stored for {0}")]
    PageNotFound(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
