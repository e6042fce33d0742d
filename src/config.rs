//! Output and logging settings shared by the CLI and the web view.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("simulations")
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("charts")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            chart_dir: default_chart_dir(),
        }
    }
}

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over the
/// configured level. Safe to call more than once.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_sections() {
        let output: OutputConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(output, OutputConfig::default());
        let logging: LoggingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(logging.level, "info");
    }

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing(&LoggingConfig::default());
        init_tracing(&LoggingConfig {
            level: "not a directive ===".into(),
        });
    }
}
