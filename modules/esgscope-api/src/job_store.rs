//! Job record storage.
//!
//! The orchestrator owns a job's record for the duration of a run and
//! publishes it here at stage boundaries; pollers read until the TTL
//! (measured from last write) lapses. Writes are sequential per job, so an
//! externally shared backend with last-writer-wins semantics would behave
//! identically.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use esgscope_common::JobRecord;

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Stamp `updated_at` and persist the record.
    async fn set(&self, record: JobRecord);

    /// Fetch a record. Absent and TTL-expired records both come back `None`.
    async fn get(&self, job_id: &str) -> Option<JobRecord>;
}

pub struct InMemoryJobStore {
    ttl: Duration,
    records: Mutex<HashMap<String, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn set(&self, mut record: JobRecord) {
        record.updated_at = Utc::now();
        self.records
            .lock()
            .await
            .insert(record.job_id.clone(), record);
    }

    async fn get(&self, job_id: &str) -> Option<JobRecord> {
        let mut records = self.records.lock().await;
        let expired = match records.get(job_id) {
            Some(record) => Utc::now()
                .signed_duration_since(record.updated_at)
                .to_std()
                .map(|age| age > self.ttl)
                .unwrap_or(false),
            None => return None,
        };
        if expired {
            records.remove(job_id);
            return None;
        }
        records.get(job_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use esgscope_common::{JobStatus, Stage};

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = InMemoryJobStore::new(Duration::from_secs(3600));
        let record = JobRecord::new(vec!["a.txt".to_string()]);
        let job_id = record.job_id.clone();
        store.set(record).await;

        let fetched = store.get(&job_id).await.expect("record present");
        assert_eq!(fetched.status, JobStatus::Queued);
        assert_eq!(fetched.stage, Stage::Upload);
    }

    #[tokio::test]
    async fn absent_job_is_none() {
        let store = InMemoryJobStore::new(Duration::from_secs(3600));
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn expired_record_becomes_unreadable() {
        let store = InMemoryJobStore::new(Duration::from_secs(3600));
        let record = JobRecord::new(vec![]);
        let job_id = record.job_id.clone();
        store.set(record).await;

        // Age the stored record past the TTL by hand.
        {
            let mut records = store.records.lock().await;
            let stored = records.get_mut(&job_id).expect("stored");
            stored.updated_at = Utc::now() - TimeDelta::seconds(3601);
        }

        assert!(store.get(&job_id).await.is_none());
        // Expiry evicts, so the record stays gone.
        assert!(store.records.lock().await.is_empty());
    }

    #[tokio::test]
    async fn set_refreshes_the_ttl_clock() {
        let store = InMemoryJobStore::new(Duration::from_secs(3600));
        let mut record = JobRecord::new(vec![]);
        record.updated_at = Utc::now() - TimeDelta::seconds(7200);
        let job_id = record.job_id.clone();
        store.set(record).await;
        assert!(store.get(&job_id).await.is_some());
    }
}
