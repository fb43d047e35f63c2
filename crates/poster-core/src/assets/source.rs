//! Where asset bytes come from.
//!
//! The loader only needs "bytes for a location". Native callers read from a
//! directory with [`FsSource`]; tests and embedders use [`MemorySource`]; the
//! browser bindings provide a `fetch`-backed implementation.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A failed fetch of one location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {reason}")]
pub struct FetchError {
    pub location: String,
    pub reason: String,
}

impl FetchError {
    pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// Asynchronous provider of raw asset bytes.
///
/// Futures are not required to be `Send`: all loads are driven from a single
/// logical thread.
pub trait AssetSource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// Normalize and validate a root-relative asset location.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute
/// paths or parent traversals (`..`).
pub fn normalize_location(location: &str) -> Result<String, FetchError> {
    let s = location.replace('\\', "/");
    if s.starts_with('/') {
        return Err(FetchError::new(location, "asset locations must be relative"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(FetchError::new(location, "asset locations must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(FetchError::new(location, "asset location must be non-empty"));
    }
    Ok(out.join("/"))
}

/// Reads assets from files under a root directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsSource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> {
        let resolved = normalize_location(location).map(|rel| self.root.join(rel));
        let location = location.to_string();
        async move {
            let path = resolved?;
            std::fs::read(&path).map_err(|e| FetchError::new(location, e.to_string()))
        }
    }
}

/// Serves assets from an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` under `location`, replacing any previous entry.
    pub fn insert(&mut self, location: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(location.into(), bytes);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, location: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(location, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> {
        let result = self
            .files
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::new(location, "not found"));
        std::future::ready(result)
    }
}
