//! Per-member usage statistics.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

/// Render time spent on one completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTime {
    pub job_id: JobId,
    pub member_id: String,
    pub time_ms: i64,
    pub created_at: Timestamp,
}

/// Aggregated usage of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStats {
    pub member_id: String,
    pub count: i64,
    pub time_ms: i64,
}

/// Storage for usage statistics.
#[async_trait]
pub trait StatisticsRepo: Send + Sync {
    async fn add_processing_time(&self, record: ProcessingTime) -> Result<(), CoreError>;

    /// `None` when the member has no recorded jobs.
    async fn stats_by_member(&self, member_id: &str) -> Result<Option<MemberStats>, CoreError>;
}

/// Process-local statistics; lost on restart.
///
/// Only the running total per member is kept, not the individual records.
#[derive(Debug, Default)]
pub struct InMemoryStatisticsRepo {
    members: Mutex<HashMap<String, MemberStats>>,
}

impl InMemoryStatisticsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, MemberStats>>, CoreError> {
        self.members
            .lock()
            .map_err(|_| CoreError::Internal("statistics lock poisoned".to_string()))
    }
}

#[async_trait]
impl StatisticsRepo for InMemoryStatisticsRepo {
    async fn add_processing_time(&self, record: ProcessingTime) -> Result<(), CoreError> {
        if record.member_id.is_empty() {
            return Err(CoreError::Validation(
                "Member id must not be empty".to_string(),
            ));
        }

        let mut members = self.lock()?;
        let stats = members
            .entry(record.member_id.clone())
            .or_insert_with(|| MemberStats {
                member_id: record.member_id,
                count: 0,
                time_ms: 0,
            });
        stats.count += 1;
        stats.time_ms = stats.time_ms.saturating_add(record.time_ms);
        Ok(())
    }

    async fn stats_by_member(&self, member_id: &str) -> Result<Option<MemberStats>, CoreError> {
        Ok(self.lock()?.get(member_id).cloned())
    }
}
