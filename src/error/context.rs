//! Where an error happened: the operation, the component that ran it and
//! the stream URL involved.

use chrono::{DateTime, Utc};

/// Context attached to a [`SiftError`](super::SiftError) on its way out.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// Operation that failed, e.g. `connect` or `read`.
    pub operation: String,

    /// Component that ran the operation, e.g. `tail` or `store`.
    pub component: Option<String>,

    /// Event-stream or backend URL.
    pub url: Option<String>,

    /// When the context was attached.
    pub timestamp: DateTime<Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            component: None,
            url: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// `key=value` pairs for a log line.
    pub fn to_log_string(&self) -> String {
        let mut parts = vec![format!("operation={}", self.operation)];
        if let Some(ref component) = self.component {
            parts.push(format!("component={}", component));
        }
        if let Some(ref url) = self.url {
            parts.push(format!("url={}", url));
        }
        parts.push(format!("timestamp={}", self.timestamp.to_rfc3339()));
        parts.join(" ")
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.component {
            Some(ref component) => write!(f, "{} {}", component, self.operation)?,
            None => write!(f, "{}", self.operation)?,
        }
        if let Some(ref url) = self.url {
            write!(f, " {}", url)?;
        }
        Ok(())
    }
}
