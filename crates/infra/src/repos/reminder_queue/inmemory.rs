use super::IReminderQueueRepo;
use crate::repos::shared::inmemory_repo::*;
use barbershop_booking_domain::{ReminderQueueEntry, ReminderStatus, RetryPolicy, ID};

pub struct InMemoryReminderQueueRepo {
    entries: std::sync::Mutex<Vec<ReminderQueueEntry>>,
}

impl InMemoryReminderQueueRepo {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderQueueRepo for InMemoryReminderQueueRepo {
    async fn insert(&self, entry: &ReminderQueueEntry) -> anyhow::Result<()> {
        insert(entry, &self.entries);
        Ok(())
    }

    async fn find(&self, entry_id: &ID) -> anyhow::Result<Option<ReminderQueueEntry>> {
        Ok(find(entry_id, &self.entries))
    }

    async fn find_due(
        &self,
        now: i64,
        policy: &RetryPolicy,
        limit: i64,
    ) -> anyhow::Result<Vec<ReminderQueueEntry>> {
        let mut due = find_by(&self.entries, |e| e.is_due(now, policy));
        due.sort_by_key(|e| e.scheduled_ts);
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn claim_attempt(&self, entry: &ReminderQueueEntry, now: i64) -> anyhow::Result<bool> {
        Ok(update_if(
            &entry.id,
            &self.entries,
            |e| {
                e.attempts == entry.attempts
                    && e.status == entry.status
                    && e.status != ReminderStatus::Sent
            },
            |e| e.begin_attempt(now),
        ))
    }

    async fn record_attempt(
        &self,
        entry: &ReminderQueueEntry,
        expected_attempts: i64,
    ) -> anyhow::Result<bool> {
        Ok(update_if(
            &entry.id,
            &self.entries,
            |e| e.attempts == expected_attempts && e.status != ReminderStatus::Sent,
            |e| *e = entry.clone(),
        ))
    }
}
