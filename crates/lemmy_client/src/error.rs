//! Error type for the Lemmy client.

use std::path::PathBuf;

use thiserror::Error;

use crate::request::Method;

/// Errors returned by the client.
///
/// Whether most of these reach the caller depends on the
/// [`ErrorPolicy`](crate::ErrorPolicy) the client was built with.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client could not be built (TLS backend, bad defaults).
    #[error("Failed to build the HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// Fetching the nodeinfo document failed, or its body is not JSON.
    /// `detail` is the full cause chain.
    #[error("Problem encountered retrieving nodeinfo from {url}: {detail}")]
    Discovery { url: String, detail: String },

    /// Connection error, timeout, or a body that could not be read.
    /// `detail` is the full cause chain of `source`.
    #[error("Error encountered while {method} on endpoint {endpoint}: {detail}")]
    Transport {
        method: Method,
        endpoint: String,
        detail: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status. `body` is the response text.
    #[error("Error encountered while {method} on endpoint {endpoint}: HTTP {status}: {body}")]
    Status {
        method: Method,
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Success status but the body is not JSON.
    #[error("Error encountered while {method} on endpoint {endpoint}: {source}")]
    Decode {
        method: Method,
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading a local file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The response parsed but lacks a field the operation needs.
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// A backgrounded upload did not produce exactly one upload id.
    /// Returned regardless of the error policy.
    #[error("Backgrounded upload rejected: {0}")]
    UploadRejected(&'static str),

    /// Configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn transport(method: Method, endpoint: &str, source: reqwest::Error) -> Self {
        Error::Transport {
            method,
            endpoint: endpoint.to_string(),
            detail: error_chain(&source),
            source,
        }
    }
}

/// Join an error and all of its causes with `": "`.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut cause = err.source();
    while let Some(err) = cause {
        let text = err.to_string();
        if !detail.ends_with(&text) {
            detail.push_str(": ");
            detail.push_str(&text);
        }
        cause = err.source();
    }
    detail
}
