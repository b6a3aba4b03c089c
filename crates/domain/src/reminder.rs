use crate::shared::entity::{Entity, ID};
use crate::timespan::TimeSpan;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

const MINUTE: i64 = 1000 * 60;

/// A `ReminderQueueEntry` is a durable request to send a reminder email
/// for an `Appointment` at `scheduled_ts`.
///
/// The `status` field doubles as the "already sent" marker: the dispatcher
/// only picks up entries that are still `Pending` or are `Error` and eligible
/// for a retry according to the `RetryPolicy`.
///
/// A delivery starts with `begin_attempt`, which is persisted before the
/// message goes out. Until the backoff for that attempt has passed the entry
/// is not due, so an overlapping run leaves it alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderQueueEntry {
    pub id: ID,
    pub appointment_id: ID,
    /// Forwarded to the email sender as the `type` of the message
    pub reminder_type: String,
    pub status: ReminderStatus,
    pub scheduled_ts: i64,
    /// Number of delivery attempts so far. Never decreases.
    pub attempts: i64,
    pub last_error: Option<String>,
    pub last_attempt_ts: Option<i64>,
    pub sent_ts: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Error,
}

#[derive(Error, Debug)]
#[error("Unknown reminder status: {0}")]
pub struct InvalidReminderStatus(String);

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Error => "error",
        }
    }
}

impl Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderStatus {
    type Err = InvalidReminderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "error" => Ok(Self::Error),
            _ => Err(InvalidReminderStatus(s.to_string())),
        }
    }
}

/// Decides when a failed `ReminderQueueEntry` is picked up again.
///
/// The wait before retry `n` is `base_backoff_millis * 2^(n - 1)` counted
/// from the last attempt. Entries that reached `max_attempts` stay in the
/// `Error` state for manual inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: i64,
    pub base_backoff_millis: i64,
}

impl RetryPolicy {
    pub fn backoff_millis(&self, attempts: i64) -> i64 {
        if attempts <= 0 {
            return 0;
        }
        let exponent = (attempts - 1).min(16) as u32;
        self.base_backoff_millis.saturating_mul(1 << exponent)
    }

    /// Earliest timestamp at which the entry may be attempted (again).
    /// `None` when it is sent or out of attempts.
    pub fn next_attempt_ts(&self, entry: &ReminderQueueEntry) -> Option<i64> {
        if entry.status == ReminderStatus::Sent || entry.attempts >= self.max_attempts {
            return None;
        }
        match entry.last_attempt_ts {
            None => Some(entry.scheduled_ts),
            Some(last_attempt) => Some(
                last_attempt
                    .saturating_add(self.backoff_millis(entry.attempts))
                    .max(entry.scheduled_ts),
            ),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_millis: 5 * MINUTE,
        }
    }
}

impl ReminderQueueEntry {
    pub fn new(appointment_id: ID, reminder_type: &str, scheduled_ts: i64) -> Self {
        Self {
            id: Default::default(),
            appointment_id,
            reminder_type: reminder_type.into(),
            status: ReminderStatus::Pending,
            scheduled_ts,
            attempts: 0,
            last_error: None,
            last_attempt_ts: None,
            sent_ts: None,
        }
    }

    pub fn is_due(&self, now: i64, policy: &RetryPolicy) -> bool {
        policy
            .next_attempt_ts(self)
            .map(|attempt_at| attempt_at <= now)
            .unwrap_or(false)
    }

    /// Counts the attempt before anything is sent
    pub fn begin_attempt(&mut self, now: i64) {
        self.attempts += 1;
        self.last_attempt_ts = Some(now);
    }

    pub fn record_success(&mut self, now: i64) {
        self.status = ReminderStatus::Sent;
        self.sent_ts = Some(now);
        self.last_error = None;
    }

    pub fn record_failure(&mut self, error: String) {
        self.status = ReminderStatus::Error;
        self.last_error = Some(error);
    }
}

impl Entity for ReminderQueueEntry {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Fixed lead times before an appointment at which a push notification
/// is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderHorizon {
    ThirtyMinutes,
    TwoHours,
    TwentyFourHours,
}

impl ReminderHorizon {
    pub const ALL: [ReminderHorizon; 3] = [
        ReminderHorizon::ThirtyMinutes,
        ReminderHorizon::TwoHours,
        ReminderHorizon::TwentyFourHours,
    ];

    /// Width of the catch-up window for the longer horizons. It matches the
    /// expected cadence of the push job.
    pub const WINDOW_MILLIS: i64 = 5 * MINUTE;

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ThirtyMinutes => "reminder_30min",
            Self::TwoHours => "reminder_2h",
            Self::TwentyFourHours => "reminder_24h",
        }
    }

    pub fn lead_millis(&self) -> i64 {
        match self {
            Self::ThirtyMinutes => 30 * MINUTE,
            Self::TwoHours => 2 * 60 * MINUTE,
            Self::TwentyFourHours => 24 * 60 * MINUTE,
        }
    }

    /// Start times of the appointments that should be reminded at `now`.
    ///
    /// The 30 minute horizon covers everything from now until 30 minutes
    /// ahead, the others only the slice that entered the horizon since
    /// the previous run.
    pub fn window(&self, now: i64) -> TimeSpan {
        match self {
            Self::ThirtyMinutes => TimeSpan::new(now, now + self.lead_millis()),
            _ => {
                let start = now + self.lead_millis();
                TimeSpan::new(start, start + Self::WINDOW_MILLIS)
            }
        }
    }
}
