use serde::{Deserialize, Serialize};

use crate::domain::JobId;

/// Read-only snapshot of a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub queue_length: usize,
    pub in_flight: usize,
    pub max_concurrency: usize,
    pub retained_count: usize,
    pub is_processing: bool,
    pub last_dispatched_id: Option<JobId>,
    pub last_added_id: Option<JobId>,
}
