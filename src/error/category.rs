//! Error category classification for unified error handling.
//!
//! Categories give callers one switch to decide between retrying,
//! surfacing the problem to whoever wrote the filter, or treating it as a bug.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport problems (connection refused, read failure, timeout).
    /// Generally transient and retryable.
    Network,

    /// The remote side misbehaved (5xx status, wrong content type).
    /// Generally transient and retryable after delay.
    Server,

    /// Misuse of the API (sending on a closed writer, empty messages).
    /// Not retryable - indicates a programming error.
    Client,

    /// Invalid input supplied by a user (malformed filter text, bad request).
    /// Not retryable until the input is corrected.
    User,

    /// Invalid configuration (sink cannot flush, zero-sized queue).
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns a user-friendly description of the category.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network connectivity issue",
            ErrorCategory::Server => "Server-side issue",
            ErrorCategory::Client => "Application error",
            ErrorCategory::User => "Invalid input",
            ErrorCategory::Configuration => "Configuration problem",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check the connection to the event source and try again",
            ErrorCategory::Server => "The server may be experiencing issues. Please try again later",
            ErrorCategory::Client => "This may be a bug. Please report this issue if it persists",
            ErrorCategory::User => "Please check your input and try again",
            ErrorCategory::Configuration => "Check your configuration settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
