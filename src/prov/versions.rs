//! Per-build registry of which commits touched each file

use std::collections::HashMap;

/// Ordered commit shas per filename, scoped to one build.
#[derive(Debug, Default)]
pub struct VersionTracker {
    versions: HashMap<String, Vec<String>>,
}

impl VersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `sha` touched `filename`.
    ///
    /// Call only after the commit's usage/derivation lookups for the file,
    /// otherwise the commit would find itself as its own predecessor.
    pub fn register_version(&mut self, filename: &str, sha: &str) {
        self.versions
            .entry(filename.to_string())
            .or_default()
            .push(sha.to_string());
    }

    /// Last commit that touched `filename`, `None` for a first known version.
    pub fn previous_version(&self, filename: &str) -> Option<&str> {
        self.versions
            .get(filename)
            .and_then(|shas| shas.last())
            .map(String::as_str)
    }

    /// Full version chain of a file, oldest first
    pub fn versions(&self, filename: &str) -> &[String] {
        self.versions.get(filename).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn file_count(&self) -> usize {
        self.versions.len()
    }
}
