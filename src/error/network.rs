//! Network-related error types.
//!
//! Errors raised while opening an event stream over HTTP.

use std::fmt;

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed {
        url: String,
        message: String,
    },

    /// DNS resolution failed.
    DnsResolutionFailed {
        host: String,
    },

    /// Request timed out.
    Timeout {
        operation: String,
    },

    /// TLS/SSL error.
    TlsError {
        message: String,
    },

    /// HTTP status error (non-2xx response).
    HttpStatus {
        status: u16,
        message: String,
    },

    /// The URL could not be used for a request.
    InvalidUrl {
        url: String,
    },

    /// Reading the response body failed.
    Body {
        message: String,
    },

    /// Generic network error.
    Other {
        message: String,
    },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::DnsResolutionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::TlsError { .. } => false,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::InvalidUrl { .. } => false,
            NetworkError::Body { .. } => true,
            NetworkError::Other { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { url, .. } => {
                format!("Unable to connect to '{}'.", url)
            }
            NetworkError::DnsResolutionFailed { host } => {
                format!("Could not resolve server address '{}'.", host)
            }
            NetworkError::Timeout { operation } => {
                format!("The {} timed out. The server may be slow or unreachable.", operation)
            }
            NetworkError::TlsError { .. } => {
                "A secure connection could not be established.".to_string()
            }
            NetworkError::HttpStatus { status, .. } => match *status {
                401 | 403 => "The event source refused the request.".to_string(),
                404 => "The event source was not found.".to_string(),
                500..=599 => "The server is experiencing issues. Please try again later.".to_string(),
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            NetworkError::InvalidUrl { url } => format!("'{}' is not a valid URL.", url),
            NetworkError::Body { .. } => "The response body could not be read.".to_string(),
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::DnsResolutionFailed { .. } => "E_NET_DNS",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::TlsError { .. } => "E_NET_TLS",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::InvalidUrl { .. } => "E_NET_URL",
            NetworkError::Body { .. } => "E_NET_BODY",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::DnsResolutionFailed { host } => {
                write!(f, "DNS resolution failed for '{}'", host)
            }
            NetworkError::Timeout { operation } => write!(f, "{} timed out", operation),
            NetworkError::TlsError { message } => write!(f, "TLS error: {}", message),
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            NetworkError::InvalidUrl { url } => write!(f, "Invalid URL: {}", url),
            NetworkError::Body { message } => write!(f, "Body read failed: {}", message),
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Classify a reqwest error into a NetworkError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str) -> NetworkError {
    if err.is_builder() {
        NetworkError::InvalidUrl {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        NetworkError::Timeout {
            operation: "HTTP request".to_string(),
        }
    } else if let Some(status) = err.status() {
        NetworkError::HttpStatus {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_body() || err.is_decode() {
        NetworkError::Body {
            message: err.to_string(),
        }
    } else {
        let err_str = err.to_string().to_lowercase();
        if err_str.contains("tls") || err_str.contains("certificate") {
            NetworkError::TlsError {
                message: err.to_string(),
            }
        } else if err_str.contains("dns") || err_str.contains("resolve") {
            NetworkError::DnsResolutionFailed {
                host: extract_host_from_url(url),
            }
        } else {
            NetworkError::Other {
                message: err.to_string(),
            }
        }
    }
}

/// Extract the host portion from a URL string.
fn extract_host_from_url(url: &str) -> String {
    let without_scheme = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);

    without_scheme
        .split(&['/', ':'][..])
        .next()
        .unwrap_or(url)
        .to_string()
}
