//! Unified error type for the sift crate.
//!
//! `SiftError` wraps the domain errors so callers mixing the event-stream
//! engine, the filter compiler and the HTTP transport can use one `Result`.

use std::fmt;

use super::category::ErrorCategory;
use super::context::ErrorContext;
use super::filter::FilterError;
use super::network::NetworkError;
use super::stream::StreamError;

/// Unified error type for the sift crate.
#[derive(Debug, Clone, PartialEq)]
pub enum SiftError {
    /// HTTP transport errors.
    Network(NetworkError),

    /// Server-Sent Events engine errors.
    Stream(StreamError),

    /// Filter compiler and store request errors.
    Filter(FilterError),

    /// Wrapped error with additional context.
    WithContext {
        error: Box<SiftError>,
        context: ErrorContext,
    },
}

impl SiftError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SiftError::Network(NetworkError::HttpStatus { status, .. }) if *status >= 500 => {
                ErrorCategory::Server
            }
            SiftError::Network(NetworkError::InvalidUrl { .. }) => ErrorCategory::Configuration,
            SiftError::Network(_) => ErrorCategory::Network,
            SiftError::Stream(err) => stream_category(err),
            SiftError::Filter(FilterError::NilRoot) => ErrorCategory::Client,
            SiftError::Filter(_) => ErrorCategory::User,
            SiftError::WithContext { error, .. } => error.category(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            SiftError::Network(err) => err.is_retryable(),
            SiftError::Stream(err) => err.is_retryable(),
            SiftError::Filter(_) => false,
            SiftError::WithContext { error, .. } => error.is_retryable(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            SiftError::Network(err) => err.user_message(),
            SiftError::Stream(err) => err.user_message(),
            SiftError::Filter(err) => err.user_message(),
            SiftError::WithContext { error, context } => {
                format!("{}\n\nContext: {}", error.user_message(), context)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SiftError::Network(err) => err.error_code(),
            SiftError::Stream(err) => err.error_code(),
            SiftError::Filter(err) => err.error_code(),
            SiftError::WithContext { error, .. } => error.error_code(),
        }
    }

    /// Attach context to this error.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        SiftError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    /// Get the context if this error has one attached.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SiftError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the inner error without context.
    pub fn inner(&self) -> &SiftError {
        match self {
            SiftError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

fn stream_category(err: &StreamError) -> ErrorCategory {
    match err {
        StreamError::Read { .. } | StreamError::Write { .. } => ErrorCategory::Network,
        StreamError::BadContentType { .. } | StreamError::CloseTimeout { .. } => ErrorCategory::Server,
        StreamError::SinkNotFlushable => ErrorCategory::Configuration,
        StreamError::Cancelled => ErrorCategory::User,
        StreamError::NoContent
        | StreamError::InvalidEventName { .. }
        | StreamError::WriterClosed
        | StreamError::Json { .. } => ErrorCategory::Client,
        StreamError::Aggregate { errors } => errors
            .first()
            .map(stream_category)
            .unwrap_or(ErrorCategory::Client),
    }
}

impl fmt::Display for SiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiftError::Network(err) => write!(f, "{}", err),
            SiftError::Stream(err) => write!(f, "{}", err),
            SiftError::Filter(err) => write!(f, "{}", err),
            SiftError::WithContext { error, context } => {
                write!(f, "{} ({})", error, context)
            }
        }
    }
}

impl std::error::Error for SiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SiftError::Network(err) => Some(err),
            SiftError::Stream(err) => Some(err),
            SiftError::Filter(err) => Some(err),
            SiftError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<NetworkError> for SiftError {
    fn from(err: NetworkError) -> Self {
        SiftError::Network(err)
    }
}

impl From<StreamError> for SiftError {
    fn from(err: StreamError) -> Self {
        SiftError::Stream(err)
    }
}

impl From<FilterError> for SiftError {
    fn from(err: FilterError) -> Self {
        SiftError::Filter(err)
    }
}

impl From<serde_json::Error> for SiftError {
    fn from(err: serde_json::Error) -> Self {
        SiftError::Stream(err.into())
    }
}

impl From<reqwest::Error> for SiftError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        SiftError::Network(super::network::classify_reqwest_error(&err, &url))
    }
}
