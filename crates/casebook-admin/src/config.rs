//! Runtime configuration for the admin binary.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Which repository implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// Process-local maps; starts empty on every run.
  Memory,
  #[default]
  Sqlite,
}

/// Deserialised from `casebook.toml` layered with `CASEBOOK_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
  #[serde(default)]
  pub backend:           Backend,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  /// Prepended to every collection name in the document store.
  #[serde(default)]
  pub collection_prefix: String,
}

fn default_store_path() -> PathBuf { PathBuf::from("casebook.db") }

impl Default for AdminConfig {
  fn default() -> Self {
    Self {
      backend:           Backend::default(),
      store_path:        default_store_path(),
      collection_prefix: String::new(),
    }
  }
}

impl AdminConfig {
  /// Read `path` (if it exists) and then the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("CASEBOOK"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise AdminConfig")
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
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

  fn temp_toml(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("casebook-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let path = std::env::temp_dir().join(format!("absent-{}.toml", uuid::Uuid::new_v4()));
    let cfg = AdminConfig::load(&path).unwrap();
    assert_eq!(cfg.backend, Backend::Sqlite);
    assert_eq!(cfg.store_path, PathBuf::from("casebook.db"));
    assert!(cfg.collection_prefix.is_empty());
  }

  #[test]
  fn file_values_are_read() {
    let path = temp_toml(
      "backend = \"memory\"\nstore_path = \"/var/lib/casebook.db\"\ncollection_prefix = \"staging_\"\n",
    );
    let cfg = AdminConfig::load(&path).unwrap();
    assert_eq!(cfg.backend, Backend::Memory);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/casebook.db"));
    assert_eq!(cfg.collection_prefix, "staging_");
    std::fs::remove_file(path).unwrap();
  }

  #[test]
  fn unknown_backend_is_rejected() {
    let path = temp_toml("backend = \"firestore\"\n");
    assert!(AdminConfig::load(&path).is_err());
    std::fs::remove_file(path).unwrap();
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let expanded = expand_tilde(Path::new("~/data/casebook.db"));
    assert_eq!(expanded, PathBuf::from(home).join("data/casebook.db"));
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}
