use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend reached, but the request was rejected (non-2xx with a body).
    #[error("backend error: {0}")]
    Backend(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Errors that indicate the backend is unreachable, as opposed to a
    /// bad request or a missing row.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Subscription(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
