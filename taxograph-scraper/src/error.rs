use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Concept document carries no @id: {0}")]
    MissingIdentity(String),

    #[error("Category page yielded no meta topics")]
    EmptyCategoryPage,

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
