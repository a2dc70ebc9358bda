//! CLI configuration from environment variables.

use super::CliError;

pub const LOG_ENV: &str = "SIFT_LOG";
pub const LAST_EVENT_ID_ENV: &str = "SIFT_LAST_EVENT_ID";
pub const TAIL_LIMIT_ENV: &str = "SIFT_TAIL_LIMIT";

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
    /// Sent as `Last-Event-ID` when tailing
    pub last_event_id: Option<String>,
    /// Stop tailing after this many messages
    pub tail_limit: Option<usize>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            last_event_id: None,
            tail_limit: None,
        }
    }
}

impl CliConfig {
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let tail_limit = match get(TAIL_LIMIT_ENV) {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|_| CliError::Config {
                var: TAIL_LIMIT_ENV,
                message: format!("expected a non-negative integer, got '{}'", raw),
            })?),
            None => None,
        };

        Ok(Self {
            log_filter: get(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            last_event_id: get(LAST_EVENT_ID_ENV),
            tail_limit,
        })
    }

    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }

    pub fn with_tail_limit(mut self, limit: usize) -> Self {
        self.tail_limit = Some(limit);
        self
    }
}
