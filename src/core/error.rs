//! Error types for the sastblame library.

use thiserror::Error;

/// Result type alias using sastblame's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while correlating findings with blame data.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The static-analysis step could not run or produced unusable output.
    #[error("Analysis error: {message}")]
    Analysis { message: String },

    /// Credential for the resolved provider is absent or was rejected.
    #[error("{provider} authentication error: {message}")]
    ProviderAuth {
        provider: &'static str,
        message: String,
    },

    /// Repository URL matches neither GitLab nor GitHub conventions.
    #[error("Unsupported repository host: {url}")]
    ProviderUnsupported { url: String },

    /// Blame lookup failed for a single file/line range.
    ///
    /// Recovered by the analyzer: the affected finding keeps an empty blame
    /// set instead of aborting the run.
    #[error("Blame lookup failed for {path}: {message}")]
    BlameLookup { path: String, message: String },

    /// HTTP transport failure or unexpected provider response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Remote repository checkout error.
    #[error("Remote repository error: {0}")]
    Remote(String),
}

impl Error {
    /// Create a new analysis error.
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis {
            message: message.into(),
        }
    }

    /// Create a new provider authentication error.
    pub fn provider_auth(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ProviderAuth {
            provider,
            message: message.into(),
        }
    }

    /// Create a new blame lookup error.
    pub fn blame_lookup(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BlameLookup {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new HTTP error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http(message.into())
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new remote checkout error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}
