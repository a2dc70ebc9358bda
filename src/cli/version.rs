//! Version command for the sift CLI.

/// The current version of sift, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The `--version` output line.
pub fn version_line() -> String {
    format!("sift {}", VERSION)
}
