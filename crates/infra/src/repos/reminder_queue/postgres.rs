use super::IReminderQueueRepo;
use barbershop_booking_domain::{ReminderQueueEntry, RetryPolicy, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresReminderQueueRepo {
    pool: PgPool,
}

impl PostgresReminderQueueRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderQueueEntryRaw {
    entry_uid: Uuid,
    appointment_uid: Uuid,
    reminder_type: String,
    status: String,
    scheduled_ts: i64,
    attempts: i64,
    last_error: Option<String>,
    last_attempt_ts: Option<i64>,
    sent_ts: Option<i64>,
}

impl TryFrom<ReminderQueueEntryRaw> for ReminderQueueEntry {
    type Error = anyhow::Error;

    fn try_from(e: ReminderQueueEntryRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.entry_uid.into(),
            appointment_id: e.appointment_uid.into(),
            reminder_type: e.reminder_type,
            status: e.status.parse()?,
            scheduled_ts: e.scheduled_ts,
            attempts: e.attempts,
            last_error: e.last_error,
            last_attempt_ts: e.last_attempt_ts,
            sent_ts: e.sent_ts,
        })
    }
}

#[async_trait::async_trait]
impl IReminderQueueRepo for PostgresReminderQueueRepo {
    async fn insert(&self, entry: &ReminderQueueEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminder_queue
            (entry_uid, appointment_uid, reminder_type, status, scheduled_ts, attempts, last_error, last_attempt_ts, sent_ts)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id.inner_ref())
        .bind(entry.appointment_id.inner_ref())
        .bind(&entry.reminder_type)
        .bind(entry.status.as_str())
        .bind(entry.scheduled_ts)
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.last_attempt_ts)
        .bind(entry.sent_ts)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert reminder queue entry: {:?}. DB returned error: {:?}",
                entry, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, entry_id: &ID) -> anyhow::Result<Option<ReminderQueueEntry>> {
        let res: Option<ReminderQueueEntryRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminder_queue
            WHERE entry_uid = $1
            "#,
        )
        .bind(entry_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find reminder queue entry with id: {:?} failed. DB returned error: {:?}",
                entry_id, e
            );
            e
        })?;
        res.map(ReminderQueueEntry::try_from).transpose()
    }

    async fn find_due(
        &self,
        now: i64,
        policy: &RetryPolicy,
        limit: i64,
    ) -> anyhow::Result<Vec<ReminderQueueEntry>> {
        // Mirrors RetryPolicy::next_attempt_ts
        let entries: Vec<ReminderQueueEntryRaw> = sqlx::query_as(
            r#"
            SELECT * FROM reminder_queue AS r
            WHERE r.status <> 'sent'
                AND r.attempts < $2
                AND r.scheduled_ts <= $1
                AND (
                    r.last_attempt_ts IS NULL
                    OR r.last_attempt_ts + CASE
                        WHEN r.attempts <= 0 THEN 0
                        ELSE $3 * (1::bigint << LEAST(r.attempts - 1, 16)::int)
                    END <= $1
                )
            ORDER BY r.scheduled_ts ASC
            LIMIT $4
            "#,
        )
        .bind(now)
        .bind(policy.max_attempts)
        .bind(policy.base_backoff_millis)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Find due reminders failed. DB returned error: {:?}", e);
            e
        })?;
        entries
            .into_iter()
            .map(ReminderQueueEntry::try_from)
            .collect()
    }

    async fn claim_attempt(&self, entry: &ReminderQueueEntry, now: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminder_queue
            SET attempts = attempts + 1,
                last_attempt_ts = $4
            WHERE entry_uid = $1 AND attempts = $2 AND status = $3 AND status <> 'sent'
            "#,
        )
        .bind(entry.id.inner_ref())
        .bind(entry.attempts)
        .bind(entry.status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to claim reminder queue entry: {:?}. DB returned error: {:?}",
                entry.id, e
            );
            e
        })?;
        Ok(res.rows_affected() == 1)
    }

    async fn record_attempt(
        &self,
        entry: &ReminderQueueEntry,
        expected_attempts: i64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE reminder_queue
            SET status = $3,
                attempts = $4,
                last_error = $5,
                last_attempt_ts = $6,
                sent_ts = $7
            WHERE entry_uid = $1 AND attempts = $2 AND status <> 'sent'
            "#,
        )
        .bind(entry.id.inner_ref())
        .bind(expected_attempts)
        .bind(entry.status.as_str())
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.last_attempt_ts)
        .bind(entry.sent_ts)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to record attempt for reminder queue entry: {:?}. DB returned error: {:?}",
                entry.id, e
            );
            e
        })?;
        Ok(res.rows_affected() == 1)
    }
}
