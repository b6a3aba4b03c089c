use crate::subscription::{Subscription, SubscriptionStatus};
use chrono::TimeZone;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const DAY: i64 = 1000 * 60 * 60 * 24;

/// What a barbershop is allowed to do given its `Subscription`.
///
/// Derived from the persisted fields only, so it can be recomputed anywhere
/// with the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionAccess {
    pub is_active: bool,
    pub is_trial: bool,
    pub is_trial_expired: bool,
    pub is_trial_ending_today: bool,
    pub trial_days_remaining: Option<i64>,
    pub is_within_paid_period: bool,
    pub is_payment_required: bool,
    pub can_write: bool,
}

impl SubscriptionAccess {
    fn no_subscription() -> Self {
        Self {
            is_active: false,
            is_trial: false,
            is_trial_expired: false,
            is_trial_ending_today: false,
            trial_days_remaining: None,
            is_within_paid_period: false,
            is_payment_required: true,
            can_write: false,
        }
    }

    /// `tz` is the business timezone used to decide whether the trial ends
    /// on the same calendar day as `now`
    pub fn evaluate(subscription: Option<&Subscription>, now: i64, tz: &Tz) -> Self {
        let sub = match subscription {
            Some(sub) => sub,
            None => return Self::no_subscription(),
        };

        let is_trial = sub.status == SubscriptionStatus::Trial;
        let is_trial_expired = is_trial && sub.trial_ends_ts.map_or(false, |ends| ends <= now);
        let is_trial_ending_today =
            is_trial && sub.trial_ends_ts.map_or(false, |ends| same_day(ends, now, tz));
        let trial_days_remaining = sub.trial_ends_ts.map(|ends| days_until(ends, now));
        let is_within_paid_period = sub.current_period_end_ts.map_or(false, |end| end > now);

        let is_active = match sub.status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Canceled => is_within_paid_period,
            _ => false,
        };
        let is_payment_required = match sub.status {
            SubscriptionStatus::PastDue | SubscriptionStatus::Inactive => true,
            SubscriptionStatus::Canceled => !is_within_paid_period,
            _ => false,
        } || is_trial_expired;
        let can_write = is_active || (is_trial && !is_trial_expired);

        Self {
            is_active,
            is_trial,
            is_trial_expired,
            is_trial_ending_today,
            trial_days_remaining,
            is_within_paid_period,
            is_payment_required,
            can_write,
        }
    }
}

/// Whole days left, rounded up and never negative
fn days_until(ts: i64, now: i64) -> i64 {
    let remaining = ts - now;
    if remaining <= 0 {
        0
    } else {
        (remaining + DAY - 1) / DAY
    }
}

fn same_day(ts1: i64, ts2: i64, tz: &Tz) -> bool {
    match (
        tz.timestamp_millis_opt(ts1).single(),
        tz.timestamp_millis_opt(ts2).single(),
    ) {
        (Some(d1), Some(d2)) => d1.date_naive() == d2.date_naive(),
        _ => false,
    }
}
