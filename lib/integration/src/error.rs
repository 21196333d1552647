//! Error types for the integration crate.

use std::fmt;

/// Problems resolving or parsing stored credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No credential record was found for the reference.
    NotFound { platform: &'static str },
    /// The stored data is missing required keys.
    Invalid { platform: &'static str },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { platform } => write!(f, "{platform} credentials not found"),
            Self::Invalid { platform } => write!(f, "{platform} credentials invalid"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// A failed outbound platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The HTTP request itself failed (connection, timeout).
    Http { message: String },
    /// The platform answered with an error.
    Api { message: String },
    /// The platform's response could not be decoded.
    InvalidResponse { message: String },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { message } => write!(f, "request failed: {message}"),
            Self::Api { message } => write!(f, "API error: {message}"),
            Self::InvalidResponse { message } => {
                write!(f, "invalid response: {message}")
            }
        }
    }
}

impl std::error::Error for SendError {}
