use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::util::{non_empty_env, parse_bool_flag};

pub const LOG_FILTER_ENV: &str = "CHATLINE_LOG";
pub const LOG_PATH_ENV: &str = "CHATLINE_LOG_PATH";
pub const DEBUG_PAYLOAD_ENV: &str = "CHATLINE_DEBUG_PAYLOAD";
pub const DEFAULT_LOG_FILTER: &str = "chatline=info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_filter: String,
    pub log_path: Option<PathBuf>,
    pub debug_payload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_path: None,
            debug_payload: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let log_filter =
            non_empty_env(LOG_FILTER_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let log_path = non_empty_env(LOG_PATH_ENV).map(PathBuf::from);
        let debug_payload = std::env::var(DEBUG_PAYLOAD_ENV)
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(false);

        Ok(Self {
            log_filter,
            log_path,
            debug_payload,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if let Err(e) = EnvFilter::try_new(&self.log_filter) {
            bail!("Invalid {LOG_FILTER_ENV} '{}': {e}", self.log_filter);
        }

        if let Some(path) = &self.log_path {
            if path.as_os_str().to_string_lossy().trim().is_empty() {
                bail!("{LOG_PATH_ENV} must not be blank");
            }
            if path.is_dir() {
                bail!(
                    "{LOG_PATH_ENV} '{}' points to a directory, expected a file",
                    path.display()
                );
            }
        }

        Ok(())
    }
}
