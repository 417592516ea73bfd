//! tunematch
//!
//! Matches the tracks of an iTunes library export against the Spotify catalog
//! and imports them as saved tracks and playlists.
//!
//! # Modules
//!
//! - `catalog` - The remote catalog seam and its error type
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `importer` - Drives resolution and writes results back to the catalog
//! - `library` - iTunes `Library.xml` parser
//! - `management` - Persistent match cache, missing log and token storage
//! - `matching` - Normalization, scoring and candidate resolution
//! - `retry` - Retry-until-ready combinator for rate-limited calls
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

pub mod catalog;
pub mod cli;
pub mod config;
pub mod importer;
pub mod library;
pub mod management;
pub mod matching;
pub mod retry;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Uses a boxed dynamic error trait object so that command implementations
/// can propagate any error with `?`.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational line with a blue bullet.
///
/// ```ignore
/// info!("Found {} tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success line with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error to stderr and exits the process with code 1.
///
/// Only for failures the command cannot recover from; library code returns
/// errors instead.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning to stderr. The run continues.
///
/// ```ignore
/// warning!("Cannot save match cache: {}", e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
