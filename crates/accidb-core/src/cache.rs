//! Content-addressed memoisation for field extractors.
//!
//! [`CachedExtractor`] wraps any [`FieldExtractor`] so that identical
//! `(field, context)` pairs reach the inner extractor at most once per run.
//! Keys are SHA-256 digests over the length-prefixed field name and context,
//! so unrelated calls never collide and identical calls always hit.
//!
//! The cache can be backed by a JSON file to survive across runs.

use std::{
  collections::HashMap,
  fs,
  io,
  path::{Path, PathBuf},
  sync::{
    Mutex,
    PoisonError,
    atomic::{AtomicU64, Ordering},
  },
};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
  ExtractionError,
  Result,
  extract::{Extracted, FieldExtractor},
};

/// Cache key for a `(field, context)` pair.
pub fn cache_key(field: &str, context: &str) -> String {
  let mut hasher = Sha256::new();
  for part in [field, context] {
    hasher.update((part.len() as u64).to_le_bytes());
    hasher.update(part.as_bytes());
  }
  hex::encode(hasher.finalize())
}

/// Hit/miss counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub hits:   u64,
  pub misses: u64,
}

pub struct CachedExtractor<E> {
  inner:   E,
  entries: Mutex<HashMap<String, Extracted>>,
  path:    Option<PathBuf>,
  hits:    AtomicU64,
  misses:  AtomicU64,
}

impl<E> CachedExtractor<E> {
  /// An in-memory cache, discarded with the extractor.
  pub fn new(inner: E) -> Self {
    Self {
      inner,
      entries: Mutex::new(HashMap::new()),
      path: None,
      hits: AtomicU64::new(0),
      misses: AtomicU64::new(0),
    }
  }

  /// A cache persisted at `path`. Existing entries are loaded; a missing file
  /// starts an empty cache. Call [`flush`](Self::flush) to write back.
  pub fn with_file(inner: E, path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    let entries = read_entries(&path)?;
    debug!(path = %path.display(), entries = entries.len(), "loaded extraction cache");
    Ok(Self {
      entries: Mutex::new(entries),
      path: Some(path),
      ..Self::new(inner)
    })
  }

  /// Write the cache to its backing file, if it has one.
  pub fn flush(&self) -> Result<()> {
    let Some(path) = &self.path else {
      return Ok(());
    };
    let json = {
      let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
      serde_json::to_string(&*entries)?
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    debug!(path = %path.display(), "flushed extraction cache");
    Ok(())
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      hits:   self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
    }
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn inner(&self) -> &E { &self.inner }

  fn lookup(&self, key: &str) -> Option<Extracted> {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(key)
      .cloned()
  }

  fn remember(&self, key: String, value: Extracted) {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, value);
  }
}

impl<E: FieldExtractor> FieldExtractor for CachedExtractor<E> {
  async fn extract(
    &self,
    field: &str,
    context: &str,
  ) -> Result<Extracted, ExtractionError> {
    let key = cache_key(field, context);

    if let Some(hit) = self.lookup(&key) {
      self.hits.fetch_add(1, Ordering::Relaxed);
      debug!(field, key = &key[..8], "extraction cache hit");
      return Ok(hit);
    }

    self.misses.fetch_add(1, Ordering::Relaxed);
    debug!(field, key = &key[..8], "extraction cache miss");

    // Failures are not remembered; the next run retries them.
    let value = self.inner.extract(field, context).await?;
    self.remember(key, value.clone());
    Ok(value)
  }
}

fn read_entries(path: &Path) -> Result<HashMap<String, Extracted>> {
  match fs::read_to_string(path) {
    Ok(s) if s.trim().is_empty() => Ok(HashMap::new()),
    Ok(s) => Ok(serde_json::from_str(&s)?),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
    Err(e) => Err(e.into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::testing::StaticExtractor;

  fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
      "accidb-cache-{}-{name}.json",
      std::process::id()
    ))
  }

  #[test]
  fn keys_are_content_derived() {
    assert_eq!(cache_key("title", "ctx"), cache_key("title", "ctx"));
    assert_ne!(cache_key("title", "ctx"), cache_key("injuries", "ctx"));
    // Length prefixes keep the field/context boundary unambiguous.
    assert_ne!(cache_key("ab", "c"), cache_key("a", "bc"));
    assert_eq!(cache_key("f", "c").len(), 64);
  }

  #[tokio::test]
  async fn identical_pairs_reach_inner_once() {
    let cached = CachedExtractor::new(
      StaticExtractor::new().with("fatalities", Extracted::Number(2)),
    );

    for _ in 0..3 {
      let v = cached.extract("fatalities", "deux morts").await.unwrap();
      assert_eq!(v, Extracted::Number(2));
    }
    cached.extract("fatalities", "autre contexte").await.unwrap();

    assert_eq!(cached.inner().calls(), 2);
    assert_eq!(cached.stats(), CacheStats { hits: 2, misses: 2 });
    assert_eq!(cached.len(), 2);
  }

  #[tokio::test]
  async fn failures_are_not_cached() {
    let cached = CachedExtractor::new(StaticExtractor::new().failing(
      "title",
      ExtractionError::Transport("timeout".into()),
    ));

    assert!(cached.extract("title", "ctx").await.is_err());
    assert!(cached.extract("title", "ctx").await.is_err());
    assert_eq!(cached.inner().calls(), 2);
    assert!(cached.is_empty());
  }

  #[tokio::test]
  async fn file_backed_cache_survives_reload() {
    let path = temp_path("reload");
    let _ = fs::remove_file(&path);

    let first = CachedExtractor::with_file(
      StaticExtractor::new().with("title", Extracted::Text("Fuite".into())),
      &path,
    )
    .unwrap();
    first.extract("title", "ctx").await.unwrap();
    first.flush().unwrap();

    let second = CachedExtractor::with_file(StaticExtractor::new(), &path).unwrap();
    let v = second.extract("title", "ctx").await.unwrap();
    assert_eq!(v, Extracted::Text("Fuite".into()));
    assert_eq!(second.inner().calls(), 0);

    fs::remove_file(&path).unwrap();
  }
}
