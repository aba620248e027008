//! Runtime settings for the SQLite backend.
//!
//! Read from an optional config file, then overridden by `SESSIONKIT_*`
//! environment variables:
//!
//! ```toml
//! store_path         = "~/.local/share/sessionkit/store.db"
//! storage_partitions = [0, 12]
//! ```
//!
//! `SESSIONKIT_STORAGE_PARTITIONS` takes a comma-separated list.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Database file. A leading `~/` is expanded against `$HOME`.
  pub store_path:         PathBuf,
  /// Partitions searched by lookups that respect partitions.
  #[serde(default = "default_partitions")]
  pub storage_partitions: Vec<u64>,
}

fn default_partitions() -> Vec<u64> { vec![0] }

impl Settings {
  /// Load settings from `path` (if it exists) and the environment.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.as_ref()).required(false))
      .add_source(
        config::Environment::with_prefix("SESSIONKIT")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("storage_partitions"),
      )
      .build()?
      .try_deserialize()?;
    Ok(settings)
  }

  pub fn resolved_store_path(&self) -> PathBuf {
    match (self.store_path.strip_prefix("~"), std::env::var_os("HOME")) {
      (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
      _ => self.store_path.clone(),
    }
  }
}
