use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] marks_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Both a title and a URL are required")]
    MissingBookmarkFields,
    #[error("Bookmark ID cannot be empty")]
    EmptyBookmarkId,
    #[error("Bookmark not found for id/prefix: {0}")]
    BookmarkNotFound(String),
    #[error("{0}")]
    AmbiguousBookmarkId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Profile '{0}' has no Supabase project. Run `marks config init --supabase-url <URL> --supabase-anon-key <KEY>` or set SUPABASE_URL and SUPABASE_ANON_KEY."
    )]
    NotConfigured(String),
    #[error("Not signed in. Run `marks auth login --email <EMAIL> --password <PASSWORD>` first.")]
    NotSignedIn,
}
