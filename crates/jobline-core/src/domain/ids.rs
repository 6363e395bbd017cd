//! Job identity.
//!
//! Ids are caller-supplied strings. When a job carries no id the queue asks an
//! [`IdGenerator`](crate::ports::IdGenerator) for one, so both kinds share the
//! same type and the same dedup rules.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a queued job.
///
/// Immutable once the job is admitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn display_is_the_raw_id() {
        let id = JobId::from("order-42");
        assert_eq!(id.to_string(), "order-42");
        assert_eq!(id.as_str(), "order-42");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = JobId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");

        let back: JobId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn set_lookup_by_str() {
        // Borrow<str> lets the dedup sets be queried without allocating.
        let mut set = HashSet::new();
        set.insert(JobId::from("a"));
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
    }
}
