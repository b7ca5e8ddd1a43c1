//! Snapshot of the variables a scheduler exported to this process.
//!
//! A [`JobContext`] is captured once and never re-reads the live process
//! environment. Values the resolver itself publishes (the rendezvous address
//! and port) go into a separate derived layer so that child processes can
//! inherit them; the snapshot is never modified.

use std::collections::{BTreeMap, HashMap};

use crate::error::{RendezvousError, Result};

#[derive(Debug, Clone, Default)]
pub struct JobContext {
    snapshot: HashMap<String, String>,
    derived: BTreeMap<String, String>,
}

impl JobContext {
    pub fn new(snapshot: HashMap<String, String>) -> Self {
        Self {
            snapshot,
            derived: BTreeMap::new(),
        }
    }

    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self::new(std::env::vars().collect())
    }

    /// Look up a variable, snapshot first, then values published by the resolver.
    pub fn get_optional(&self, name: &str) -> Option<&str> {
        self.snapshot
            .get(name)
            .or_else(|| self.derived.get(name))
            .map(String::as_str)
    }

    pub fn get_required(&self, name: &str) -> Result<&str> {
        self.get_optional(name)
            .ok_or_else(|| RendezvousError::missing(name))
    }

    /// Whether the scheduler (not the resolver) exported `name`.
    pub fn is_exported(&self, name: &str) -> bool {
        self.snapshot.contains_key(name)
    }

    /// Publish a derived value. Write-once: returns false and keeps the
    /// existing value if `name` was already published.
    pub fn publish(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.derived.contains_key(&name) {
            return false;
        }
        self.derived.insert(name, value.into());
        true
    }

    /// Values published by the resolver, for handing to child processes.
    pub fn derived(&self) -> &BTreeMap<String, String> {
        &self.derived
    }
}

impl<K, V> FromIterator<(K, V)> for JobContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
