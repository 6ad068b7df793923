//! [`Fingerprint`] and [`FingerprintStore`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Cheap change-detection token: stringified length + modification millis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(len: u64, last_modified: DateTime<Utc>) -> Self {
        Self(format!("{}{}", len, last_modified.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource identifier → fingerprint seen by the last successful scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintStore {
    entries: HashMap<String, Fingerprint>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Fingerprint> {
        self.entries.get(id)
    }

    /// True when `fingerprint` differs from the stored one (or none is stored).
    pub fn is_changed(&self, id: &str, fingerprint: &Fingerprint) -> bool {
        self.entries.get(id) != Some(fingerprint)
    }

    pub fn insert(
        &mut self,
        id: impl Into<String>,
        fingerprint: Fingerprint,
    ) -> Option<Fingerprint> {
        self.entries.insert(id.into(), fingerprint)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Fingerprint)> for FingerprintStore {
    fn from_iter<I: IntoIterator<Item = (String, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
