use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("source returned an error: {0}")]
    SourceApi(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("response parse error: {0}")]
    Parse(String),
}
