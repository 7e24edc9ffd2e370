//! Layered configuration for the `tenantcfg` binary.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file named
//! by `--config`, then `TENANTCFG_*` environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use tenantcfg_store_sqlite::StoreOptions;

/// Runtime configuration, deserialised from `tenantcfg.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// SQLite database file; `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Bounded wait for a tenant's write section, in milliseconds.
  #[serde(default = "default_lock_timeout_ms")]
  pub lock_timeout_ms: u64,
}

fn default_store_path() -> PathBuf { PathBuf::from("tenantcfg.db") }

fn default_lock_timeout_ms() -> u64 { 5_000 }

impl CliConfig {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("TENANTCFG"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions { lock_timeout: Duration::from_millis(self.lock_timeout_ms) }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = CliConfig::load(Path::new("/nonexistent/tenantcfg.toml")).unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("tenantcfg.db"));
    assert_eq!(cfg.store_options().lock_timeout, Duration::from_secs(5));
  }

  #[test]
  fn paths_without_tilde_are_untouched() {
    assert_eq!(
      expand_tilde(Path::new("/var/lib/tenantcfg.db")),
      PathBuf::from("/var/lib/tenantcfg.db")
    );
  }
}
