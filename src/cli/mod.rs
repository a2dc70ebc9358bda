//! CLI module for sift.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Environment configuration
//! - `check` and `tail` commands
//! - Version display
//!
//! # Usage
//!
//! ```ignore
//! use sift::cli::{parse_args, run_cli_command, CliConfig};
//!
//! let config = CliConfig::from_env()?;
//! let command = parse_args(std::env::args());
//! if let Err(e) = run_cli_command(command, &config).await {
//!     eprintln!("{}", e);
//!     std::process::exit(e.exit_code());
//! }
//! ```

pub mod args;
pub mod check;
pub mod config;
pub mod tail;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use check::{handle_check_command, render_filter_error};
pub use config::CliConfig;
pub use tail::handle_tail_command;
pub use version::{version_line, VERSION};

use thiserror::Error;

use crate::adapters::ReqwestHttpClient;
use crate::error::{FilterError, SiftError};

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}\n\n{USAGE}")]
    Usage(String),

    #[error("invalid {var}: {message}")]
    Config { var: &'static str, message: String },

    #[error("{report}")]
    Filter {
        report: String,
        #[source]
        source: FilterError,
    },

    #[error("error[{}]: {}\nhint: {}", .0.error_code(), .0.user_message(), .0.recovery_hint())]
    Sift(#[from] SiftError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit status: 2 for bad arguments, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }
}

/// Run a parsed command, writing results to stdout.
pub async fn run_cli_command(command: CliCommand, config: &CliConfig) -> Result<(), CliError> {
    let mut stdout = std::io::stdout();
    match command {
        CliCommand::Version => {
            println!("{}", version_line());
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Check(expr) => handle_check_command(&expr, &mut stdout),
        CliCommand::Tail(url) => {
            let client = ReqwestHttpClient::new();
            handle_tail_command(&client, &url, config, &mut stdout)
                .await
                .map(|_| ())
        }
        CliCommand::Usage(message) => Err(CliError::Usage(message)),
    }
}
