//! Error types for diglot exports.
//!
//! Input defects (missing fields, unknown blocks, malformed colors) never
//! surface here: they are resolved to defaults where they are read. What
//! remains are failures that abort a single export.

use thiserror::Error;

/// Errors that abort an export.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive integrity violation: {0}")]
    ArchiveIntegrity(String),

    #[error("Rendering service failed: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid document snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// HTTP-style status reported to the user.
    ///
    /// A rendering timeout is kept distinct from every other failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Render(RenderError::Timeout { .. }) => 504,
            Error::Render(_) => 502,
            _ => 500,
        }
    }

    /// A fixed, user-facing sentence. Never includes internal details.
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::Render(RenderError::Timeout { .. }) => {
                "The rendering service timed out. Please try again."
            }
            Error::Render(_) => "The rendering service could not produce this export.",
            _ => "The export could not be completed.",
        }
    }
}

/// Failure talking to the external rendering service.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("no endpoint configured for {0}")]
    NotConfigured(&'static str),
}

/// Failure resolving an embedded image asset.
///
/// Never fatal: the owning block renders empty.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("unsupported image source: {0}")]
    Unsupported(String),

    #[error("malformed data URL")]
    MalformedDataUrl,

    #[error("could not fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("not a recognized image format")]
    Undecodable,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_status_is_distinct() {
        let timeout = Error::Render(RenderError::Timeout {
            endpoint: "http://fallback".to_string(),
        });
        let status = Error::Render(RenderError::Status {
            endpoint: "http://primary".to_string(),
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(timeout.status_code(), 504);
        assert_eq!(status.status_code(), 502);
        assert_ne!(timeout.user_message(), status.user_message());
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = Error::ArchiveIntegrity("spine item chapter_3 missing".to_string());
        assert_eq!(err.status_code(), 500);
        assert!(!err.user_message().contains("chapter_3"));
    }
}
