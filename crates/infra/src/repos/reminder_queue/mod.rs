mod inmemory;
mod postgres;

use barbershop_booking_domain::{ReminderQueueEntry, RetryPolicy, ID};
pub use inmemory::InMemoryReminderQueueRepo;
pub use postgres::PostgresReminderQueueRepo;

#[async_trait::async_trait]
pub trait IReminderQueueRepo: Send + Sync {
    async fn insert(&self, entry: &ReminderQueueEntry) -> anyhow::Result<()>;
    async fn find(&self, entry_id: &ID) -> anyhow::Result<Option<ReminderQueueEntry>>;
    /// At most `limit` entries that are due at `now`, oldest `scheduled_ts` first.
    /// See `ReminderQueueEntry::is_due`.
    async fn find_due(
        &self,
        now: i64,
        policy: &RetryPolicy,
        limit: i64,
    ) -> anyhow::Result<Vec<ReminderQueueEntry>>;
    /// Starts a delivery attempt by bumping `attempts` and setting
    /// `last_attempt_ts` to `now`. Only succeeds if the stored entry is not
    /// sent and still has the `attempts` and `status` of the given `entry`,
    /// so of several overlapping runs exactly one gets to send.
    async fn claim_attempt(&self, entry: &ReminderQueueEntry, now: i64) -> anyhow::Result<bool>;
    /// Persists the outcome of a claimed attempt. The write only happens if
    /// the stored entry still has `expected_attempts` attempts and is not
    /// sent, so an overlapping run can not overwrite it.
    async fn record_attempt(
        &self,
        entry: &ReminderQueueEntry,
        expected_attempts: i64,
    ) -> anyhow::Result<bool>;
}
