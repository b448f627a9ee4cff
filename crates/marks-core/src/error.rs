//! Error types for marks-core

use thiserror::Error;

use crate::auth::AuthError;

/// Result type alias using marks-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in marks-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Realtime websocket error
    #[error("Realtime connection error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Remote store rejected the request
    #[error("Remote store error: {0}")]
    Api(String),

    /// Authentication error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No signed-in session is available
    #[error("Not signed in")]
    NotSignedIn,

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
