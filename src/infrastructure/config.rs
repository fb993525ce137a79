//! Runtime configuration.
//!
//! Every setting comes from a command-line flag with an environment variable
//! fallback, so the storefront can be launched the same way from a shell or a
//! service manager.

use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_LOG_FILTER: &str = "dealspot=info";
pub const LOG_FILE_NAME: &str = "dealspot.log";

/// Terminal storefront for browsing and managing deals.
#[derive(Debug, Clone, Parser)]
#[command(name = "dealspot", version, about)]
pub struct Cli {
    /// Deal catalog to browse (.json or .csv). Uses the built-in sample catalog when omitted.
    #[arg(long, env = "DEALSPOT_DEALS")]
    pub deals: Option<PathBuf>,

    /// Directory that receives the log file.
    #[arg(long, env = "DEALSPOT_LOG_DIR", default_value = ".")]
    pub log_dir: PathBuf,

    /// Log filter directive, used when RUST_LOG is unset.
    #[arg(long, env = "DEALSPOT_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub deals_path: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deals_path: None,
            log_dir: PathBuf::from("."),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        Self {
            deals_path: cli.deals,
            log_dir: cli.log_dir,
            log_filter: cli.log_filter,
        }
    }
}

impl AppConfig {
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}
