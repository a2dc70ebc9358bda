use sift::cli::{parse_args, run_cli_command, version_line, CliCommand, CliConfig};

use color_eyre::Result;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber filtered by `SIFT_LOG`.
///
/// stdout carries command output, so logs never go there.
fn setup_logging(config: &CliConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|err| {
        eprintln!("Warning: ignoring invalid SIFT_LOG ({}), using info", err);
        EnvFilter::new("info")
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn main() -> Result<()> {
    let command = parse_args(std::env::args());

    // Handle --version before any initialization
    if command == CliCommand::Version {
        println!("{}", version_line());
        std::process::exit(0);
    }

    color_eyre::install()?;

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    };
    setup_logging(&config);

    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(e) = runtime.block_on(run_cli_command(command, &config)) {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}
