//! The `Job` capability.
//!
//! A job only has to say who it is. What it does is decided by the queue's
//! [`Handler`](crate::handler::Handler), which receives the job by value.

use serde::{Deserialize, Serialize};

use super::JobId;

/// Something that can be queued.
///
/// `job_id` returning `None` means "generate one for me".
pub trait Job: Send + 'static {
    fn job_id(&self) -> Option<JobId> {
        None
    }
}

/// A payload with an optional explicit identity.
///
/// # Example
/// ```ignore
/// queue.submit(Keyed::new("invoice-7", Invoice { .. }))?;
/// queue.submit(Keyed::anonymous(Ping))?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyed<P> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JobId>,
    pub payload: P,
}

impl<P> Keyed<P> {
    pub fn new(id: impl Into<JobId>, payload: P) -> Self {
        Self {
            id: Some(id.into()),
            payload,
        }
    }

    pub fn anonymous(payload: P) -> Self {
        Self { id: None, payload }
    }
}

impl<P: Send + 'static> Job for Keyed<P> {
    fn job_id(&self) -> Option<JobId> {
        self.id.clone()
    }
}

/// Free-form JSON jobs: a string `"id"` field, when present, is the identity.
impl Job for serde_json::Value {
    fn job_id(&self) -> Option<JobId> {
        self.get("id")
            .and_then(serde_json::Value::as_str)
            .map(JobId::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyed_exposes_its_id() {
        assert_eq!(Keyed::new("a", 1).job_id(), Some(JobId::from("a")));
        assert_eq!(Keyed::anonymous(1).job_id(), None);
    }

    #[test]
    fn json_id_field_is_used_when_it_is_a_string() {
        assert_eq!(json!({"id": "x", "n": 1}).job_id(), Some(JobId::from("x")));
        assert_eq!(json!({"id": 5}).job_id(), None);
        assert_eq!(json!({"n": 1}).job_id(), None);
    }

    #[test]
    fn keyed_deserializes_without_id() {
        let job: Keyed<u32> = serde_json::from_value(json!({"payload": 3})).unwrap();
        assert_eq!(job, Keyed::anonymous(3));
    }
}
