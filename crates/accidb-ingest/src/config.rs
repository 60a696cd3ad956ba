//! Runtime configuration.
//!
//! Read from an optional TOML file layered under `ACCIDB_*` environment
//! variables. Nested keys use a double underscore:
//! `ACCIDB_ORACLE__API_KEY` sets `oracle.api_key`.

use std::path::{Path, PathBuf};

use accidb_core::identity::IdentityGenerator;
use accidb_oracle::OracleConfig;
use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "accidb.toml";

fn default_store_path() -> PathBuf { PathBuf::from("accidb.sqlite") }

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
  /// Namespace UUID every site and accident id is derived under. Changing it
  /// changes every identifier. Only ingestion needs it.
  #[serde(default)]
  pub uuid_namespace: Option<String>,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// Maximum number of records processed per run.
  #[serde(default)]
  pub limit:          Option<usize>,
  /// Only needed for EPICEA ingestion.
  #[serde(default)]
  pub oracle:         Option<OracleConfig>,
}

impl IngestConfig {
  pub fn load(path: &Path) -> Result<Self> {
    let settings = ::config::Config::builder()
      .add_source(::config::File::from(path.to_path_buf()).required(false))
      .add_source(
        ::config::Environment::with_prefix("ACCIDB")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn identity(&self) -> Result<IdentityGenerator> {
    let namespace = self.uuid_namespace.as_deref().ok_or(Error::MissingNamespace)?;
    Ok(namespace.parse()?)
  }

  /// [`store_path`](Self::store_path) with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
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
  use std::fs;

  use super::*;

  fn write_config(name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("accidb-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn reads_a_toml_file() {
    let path = write_config(
      "full.toml",
      r#"
        uuid_namespace = "6ba7b811-9dad-11d1-80b4-00c04fd430c8"
        store_path = "/var/lib/accidb/store.sqlite"
        limit = 10

        [oracle]
        base_url = "http://localhost:11434/v1"
        model = "mistral"
      "#,
    );

    let config = IngestConfig::load(&path).unwrap();
    assert_eq!(config.limit, Some(10));
    assert_eq!(config.store_path, PathBuf::from("/var/lib/accidb/store.sqlite"));

    let oracle = config.oracle.as_ref().unwrap();
    assert_eq!(oracle.model, "mistral");
    assert_eq!(oracle.timeout_secs, 60);
    assert_eq!(oracle.api_key, None);

    let identity = config.identity().unwrap();
    assert_eq!(identity.namespace().to_string(), "6ba7b811-9dad-11d1-80b4-00c04fd430c8");
  }

  #[test]
  fn defaults_apply_and_bad_namespaces_are_rejected() {
    let path = write_config("minimal.toml", "uuid_namespace = \"not-a-uuid\"\n");

    let config = IngestConfig::load(&path).unwrap();
    assert_eq!(config.store_path, default_store_path());
    assert!(config.oracle.is_none());
    assert!(matches!(config.identity(), Err(Error::Core(_))));
  }

  #[test]
  fn namespace_is_only_needed_for_identity() {
    let path = write_config("stats.toml", "store_path = \"/tmp/stats.sqlite\"\n");

    let config = IngestConfig::load(&path).unwrap();
    assert_eq!(config.resolved_store_path(), PathBuf::from("/tmp/stats.sqlite"));
    assert!(matches!(config.identity(), Err(Error::MissingNamespace)));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/a.sqlite")), PathBuf::from(home).join("a.sqlite"));
    assert_eq!(expand_tilde(Path::new("/tmp/a")), PathBuf::from("/tmp/a"));
  }
}
