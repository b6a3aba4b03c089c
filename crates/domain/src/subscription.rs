use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Written to `last_payment_status` when a trial runs out without the
/// barbershop having subscribed at the billing provider
pub const TRIAL_EXPIRED: &str = "TRIAL_EXPIRED";

/// The plan of a barbershop (tenant). The status is kept in sync with the
/// external billing provider by the reconciliation job.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: ID,
    pub barbershop_id: ID,
    pub status: SubscriptionStatus,
    pub trial_ends_ts: Option<i64>,
    pub current_period_end_ts: Option<i64>,
    /// Subscription id at the billing provider, set once the barbershop
    /// has gone through checkout
    pub external_subscription_id: Option<String>,
    /// Raw status string of the last reconciliation, or `TRIAL_EXPIRED`
    pub last_payment_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    PastDue,
    Canceled,
    Inactive,
}

#[derive(Error, Debug)]
#[error("Unknown subscription status: {0}")]
pub struct InvalidSubscriptionStatus(String);

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Inactive => "inactive",
        }
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = InvalidSubscriptionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(Self::Trial),
            "active" => Ok(Self::Active),
            "past_due" => Ok(Self::PastDue),
            "canceled" => Ok(Self::Canceled),
            "inactive" => Ok(Self::Inactive),
            _ => Err(InvalidSubscriptionStatus(s.to_string())),
        }
    }
}

/// Subscription status as reported by the billing provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSubscriptionStatus {
    Active,
    Cancelled,
    Expired,
    Suspended,
    Other(String),
}

impl ProviderSubscriptionStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "ACTIVE" => Self::Active,
            "CANCELLED" => Self::Cancelled,
            "EXPIRED" => Self::Expired,
            "SUSPENDED" => Self::Suspended,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The parts of a billing provider subscription that matter for
/// reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSubscription {
    /// Raw status string, e.g. `ACTIVE` or `APPROVAL_PENDING`
    pub status: String,
    pub next_billing_ts: Option<i64>,
    pub last_payment_ts: Option<i64>,
}

impl ProviderSubscription {
    /// Nothing has been charged yet and the first charge lies ahead
    pub fn is_in_trial_phase(&self, now: i64) -> bool {
        self.last_payment_ts.is_none() && self.next_billing_ts.map_or(false, |ts| ts > now)
    }
}

impl Subscription {
    pub fn new_trial(barbershop_id: ID, trial_ends_ts: i64) -> Self {
        Self {
            id: Default::default(),
            barbershop_id,
            status: SubscriptionStatus::Trial,
            trial_ends_ts: Some(trial_ends_ts),
            current_period_end_ts: None,
            external_subscription_id: None,
            last_payment_status: None,
        }
    }

    pub fn is_trial_overdue(&self, now: i64) -> bool {
        self.status == SubscriptionStatus::Trial && self.trial_ends_ts.map_or(false, |ts| ts < now)
    }

    /// Moves an overdue trial to `PastDue`. Returns whether anything changed.
    pub fn expire_trial(&mut self, now: i64) -> bool {
        if !self.is_trial_overdue(now) {
            return false;
        }
        self.status = SubscriptionStatus::PastDue;
        self.last_payment_status = Some(TRIAL_EXPIRED.into());
        true
    }

    /// Whether the reconciliation job should ask the billing provider about
    /// this subscription
    pub fn is_reconcilable(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Trial | SubscriptionStatus::Active | SubscriptionStatus::PastDue
        ) && self.external_subscription_id.is_some()
    }

    pub fn apply_provider_state(&mut self, provider: &ProviderSubscription, now: i64) {
        let in_trial_phase = provider.is_in_trial_phase(now);
        self.status = match ProviderSubscriptionStatus::parse(&provider.status) {
            ProviderSubscriptionStatus::Active if in_trial_phase => SubscriptionStatus::Trial,
            ProviderSubscriptionStatus::Active => SubscriptionStatus::Active,
            ProviderSubscriptionStatus::Cancelled | ProviderSubscriptionStatus::Expired => {
                SubscriptionStatus::Canceled
            }
            ProviderSubscriptionStatus::Suspended => SubscriptionStatus::PastDue,
            ProviderSubscriptionStatus::Other(_) => SubscriptionStatus::Trial,
        };
        self.current_period_end_ts = provider.next_billing_ts;
        self.last_payment_status = Some(provider.status.clone());
        if in_trial_phase {
            self.trial_ends_ts = provider.next_billing_ts;
        }
    }
}

impl Entity for Subscription {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 1000 * 60 * 60 * 24;
    const NOW: i64 = 100 * DAY;

    fn provider(status: &str, next: Option<i64>, last: Option<i64>) -> ProviderSubscription {
        ProviderSubscription {
            status: status.into(),
            next_billing_ts: next,
            last_payment_ts: last,
        }
    }

    fn external_sub(status: SubscriptionStatus) -> Subscription {
        let mut sub = Subscription::new_trial(ID::default(), NOW + DAY);
        sub.status = status;
        sub.external_subscription_id = Some("I-123".into());
        sub
    }

    #[test]
    fn expires_overdue_trial() {
        let mut sub = Subscription::new_trial(ID::default(), NOW - DAY);
        assert!(sub.expire_trial(NOW));
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert_eq!(sub.last_payment_status.as_deref(), Some(TRIAL_EXPIRED));
    }

    #[test]
    fn keeps_running_trial() {
        let mut sub = Subscription::new_trial(ID::default(), NOW);
        assert!(!sub.expire_trial(NOW));
        assert_eq!(sub.status, SubscriptionStatus::Trial);
    }

    #[test]
    fn only_syncs_live_statuses_with_external_id() {
        assert!(external_sub(SubscriptionStatus::Trial).is_reconcilable());
        assert!(external_sub(SubscriptionStatus::Active).is_reconcilable());
        assert!(external_sub(SubscriptionStatus::PastDue).is_reconcilable());
        assert!(!external_sub(SubscriptionStatus::Canceled).is_reconcilable());
        assert!(!external_sub(SubscriptionStatus::Inactive).is_reconcilable());
        assert!(!Subscription::new_trial(ID::default(), NOW).is_reconcilable());
    }

    #[test]
    fn active_without_payment_is_still_trial() {
        let mut sub = external_sub(SubscriptionStatus::PastDue);
        sub.apply_provider_state(&provider("ACTIVE", Some(NOW + 7 * DAY), None), NOW);
        assert_eq!(sub.status, SubscriptionStatus::Trial);
        assert_eq!(sub.trial_ends_ts, Some(NOW + 7 * DAY));
        assert_eq!(sub.current_period_end_ts, Some(NOW + 7 * DAY));
        assert_eq!(sub.last_payment_status.as_deref(), Some("ACTIVE"));
    }

    #[test]
    fn active_with_payment_is_active() {
        let mut sub = external_sub(SubscriptionStatus::Trial);
        let trial_ends = sub.trial_ends_ts;
        sub.apply_provider_state(
            &provider("ACTIVE", Some(NOW + 30 * DAY), Some(NOW - DAY)),
            NOW,
        );
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.trial_ends_ts, trial_ends);
        assert_eq!(sub.current_period_end_ts, Some(NOW + 30 * DAY));
    }

    #[test]
    fn active_with_past_billing_time_is_active() {
        let mut sub = external_sub(SubscriptionStatus::Trial);
        sub.apply_provider_state(&provider("ACTIVE", Some(NOW - DAY), None), NOW);
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn trial_end_follows_provider_trial_phase_for_any_status() {
        let mut sub = external_sub(SubscriptionStatus::Trial);
        sub.apply_provider_state(&provider("CANCELLED", Some(NOW + 3 * DAY), None), NOW);
        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.trial_ends_ts, Some(NOW + 3 * DAY));

        let mut sub = external_sub(SubscriptionStatus::Active);
        let trial_ends = sub.trial_ends_ts;
        sub.apply_provider_state(&provider("SUSPENDED", Some(NOW - DAY), None), NOW);
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert_eq!(sub.trial_ends_ts, trial_ends);
    }

    #[test]
    fn maps_terminal_provider_statuses() {
        for (raw, expected) in [
            ("CANCELLED", SubscriptionStatus::Canceled),
            ("EXPIRED", SubscriptionStatus::Canceled),
            ("SUSPENDED", SubscriptionStatus::PastDue),
            ("APPROVAL_PENDING", SubscriptionStatus::Trial),
        ] {
            let mut sub = external_sub(SubscriptionStatus::Active);
            sub.apply_provider_state(&provider(raw, None, Some(NOW - DAY)), NOW);
            assert_eq!(sub.status, expected, "provider status {}", raw);
            assert_eq!(sub.last_payment_status.as_deref(), Some(raw));
            assert_eq!(sub.current_period_end_ts, None);
        }
    }
}
