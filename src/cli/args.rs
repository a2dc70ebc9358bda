//! Command-line argument parsing for the sift CLI.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Compile a filter expression and print its canonical form
    Check(String),
    /// Print messages from an event stream
    Tail(String),
    /// Arguments could not be understood
    Usage(String),
}

/// Usage text printed by `--help` and after argument errors.
pub const USAGE: &str = "\
usage: sift <command>

commands:
  check <expr>   compile a filter expression and print its canonical form
  tail <url>     print messages from a text/event-stream endpoint

options:
  -h, --help     show this help
  -V, --version  show the version

environment:
  SIFT_LOG             log filter (default: info)
  SIFT_LAST_EVENT_ID   resume tail after this event id
  SIFT_TAIL_LIMIT      stop tail after this many messages";

/// Parse command-line arguments and return the appropriate command.
///
/// Everything after `check` is joined with spaces, so an unquoted
/// expression still works.
///
/// # Examples
///
/// ```
/// use sift::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["sift".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1);
    let Some(first) = args.next() else {
        return CliCommand::Help;
    };

    match first.as_str() {
        "--version" | "-V" => CliCommand::Version,
        "--help" | "-h" | "help" => CliCommand::Help,
        "check" => {
            let expr = args.collect::<Vec<_>>().join(" ");
            if expr.trim().is_empty() {
                CliCommand::Usage("check needs a filter expression".to_string())
            } else {
                CliCommand::Check(expr)
            }
        }
        "tail" => match (args.next(), args.next()) {
            (Some(url), None) => CliCommand::Tail(url),
            (None, _) => CliCommand::Usage("tail needs a URL".to_string()),
            (Some(_), Some(extra)) => CliCommand::Usage(format!("unexpected argument '{}'", extra)),
        },
        other => CliCommand::Usage(format!("unknown command '{}'", other)),
    }
}
