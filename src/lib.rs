//! vkup library
//!
//! This library provides the pieces behind the `vkup` command: scanning local
//! album directories, transcoding lossless files, authenticating against VK
//! and uploading tracks into playlists.
//!
//! # Modules
//!
//! - `cli` - Command implementations wired to the binary
//! - `config` - Configuration management and environment variables
//! - `library` - Directory scanning, tag reading and transcoding
//! - `management` - Credentials and cached token management
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//! - `vk` - VK API client, retry layer and upload pipeline
//!
//! # Example
//!
//! ```
//! use vkup::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> vkup::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod library;
pub mod management;
pub mod types;
pub mod utils;
pub mod vk;

/// A convenient Result type alias for operations that may fail.
///
/// Uses a boxed dynamic error trait object with Send + Sync bounds so the
/// command layer can mix scan, API and I/O failures with `?`.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Processing {}", dir.display());
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Token acquired.");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only meant for the command boundary: the program terminates with exit
/// code 1 right after printing, so nothing is cleaned up by destructors.
///
/// # Example
///
/// ```
/// error!("Credentials file does not exist.");
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Captcha needed, waiting {} secs...", 120);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
