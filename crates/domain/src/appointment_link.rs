use crate::appointment::AppointmentStatus;
use crate::shared::entity::{Entity, ID};
use barbershop_booking_utils::create_random_secret;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

const TOKEN_LEN: usize = 32;

/// A single use link that lets a client act on an `Appointment` without
/// being logged in. The `token` is delivered out-of-band, usually by email.
///
/// Every `Appointment` gets one link per `LinkPurpose`. When one of them is
/// consumed all siblings are consumed as well, so a stale cancel link can
/// not be replayed after the appointment has been confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentLink {
    pub id: ID,
    pub appointment_id: ID,
    pub token: String,
    pub purpose: LinkPurpose,
    pub expires_ts: i64,
    pub used_ts: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPurpose {
    Confirm,
    Cancel,
}

/// What the client wants to do with the `Appointment`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAction {
    Confirm,
    Cancel,
}

#[derive(Error, Debug, PartialEq)]
pub enum LinkValidationError {
    #[error("The link has expired")]
    Expired,
    #[error("The link has already been used")]
    AlreadyUsed,
    #[error("The action {action} is not allowed for a {purpose} link")]
    InvalidAction {
        purpose: LinkPurpose,
        action: LinkAction,
    },
}

#[derive(Error, Debug)]
#[error("Unknown link purpose: {0}")]
pub struct InvalidLinkPurpose(String);

impl LinkPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        }
    }

    /// A confirm link also accepts a cancel so that the client can cancel
    /// from the same confirmation email.
    pub fn accepts(&self, action: LinkAction) -> bool {
        match self {
            Self::Confirm => true,
            Self::Cancel => action == LinkAction::Cancel,
        }
    }
}

impl Display for LinkPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkPurpose {
    type Err = InvalidLinkPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirm" => Ok(Self::Confirm),
            "cancel" => Ok(Self::Cancel),
            _ => Err(InvalidLinkPurpose(s.to_string())),
        }
    }
}

impl LinkAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        }
    }

    /// The `AppointmentStatus` this action moves a pending appointment into
    pub fn target_status(&self) -> AppointmentStatus {
        match self {
            Self::Confirm => AppointmentStatus::Confirmed,
            Self::Cancel => AppointmentStatus::Canceled,
        }
    }
}

impl Display for LinkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppointmentLink {
    pub fn new(appointment_id: ID, purpose: LinkPurpose, ttl_millis: i64, now: i64) -> Self {
        Self {
            id: Default::default(),
            appointment_id,
            token: create_random_secret(TOKEN_LEN),
            purpose,
            expires_ts: now + ttl_millis,
            used_ts: None,
        }
    }

    /// Creates the confirm and cancel links for a newly booked appointment
    pub fn issue_pair(appointment_id: ID, ttl_millis: i64, now: i64) -> [Self; 2] {
        [
            Self::new(appointment_id, LinkPurpose::Confirm, ttl_millis, now),
            Self::new(appointment_id, LinkPurpose::Cancel, ttl_millis, now),
        ]
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_ts < now
    }

    pub fn is_used(&self) -> bool {
        self.used_ts.is_some()
    }

    /// Checks expiry, usage and purpose in that order
    pub fn validate(&self, action: LinkAction, now: i64) -> Result<(), LinkValidationError> {
        if self.is_expired(now) {
            return Err(LinkValidationError::Expired);
        }
        if self.is_used() {
            return Err(LinkValidationError::AlreadyUsed);
        }
        if !self.purpose.accepts(action) {
            return Err(LinkValidationError::InvalidAction {
                purpose: self.purpose,
                action,
            });
        }
        Ok(())
    }
}

impl Entity for AppointmentLink {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 1000 * 60 * 60;

    #[test]
    fn issues_unique_tokens_per_purpose() {
        let appointment_id = ID::default();
        let [confirm, cancel] = AppointmentLink::issue_pair(appointment_id, HOUR, 0);
        assert_eq!(confirm.purpose, LinkPurpose::Confirm);
        assert_eq!(cancel.purpose, LinkPurpose::Cancel);
        assert_eq!(confirm.token.len(), TOKEN_LEN);
        assert_ne!(confirm.token, cancel.token);
        assert_eq!(confirm.expires_ts, HOUR);
    }

    #[test]
    fn confirm_link_accepts_both_actions() {
        assert!(LinkPurpose::Confirm.accepts(LinkAction::Confirm));
        assert!(LinkPurpose::Confirm.accepts(LinkAction::Cancel));
    }

    #[test]
    fn cancel_link_only_accepts_cancel() {
        assert!(LinkPurpose::Cancel.accepts(LinkAction::Cancel));
        assert!(!LinkPurpose::Cancel.accepts(LinkAction::Confirm));
    }

    #[test]
    fn rejects_expired_link() {
        let now = 10 * HOUR;
        let link = AppointmentLink::new(ID::default(), LinkPurpose::Cancel, -HOUR, now);
        assert_eq!(
            link.validate(LinkAction::Cancel, now),
            Err(LinkValidationError::Expired)
        );
    }

    #[test]
    fn link_is_valid_at_the_expiry_instant() {
        let link = AppointmentLink::new(ID::default(), LinkPurpose::Confirm, HOUR, 0);
        assert!(link.validate(LinkAction::Confirm, HOUR).is_ok());
        assert!(link.validate(LinkAction::Confirm, HOUR + 1).is_err());
    }

    #[test]
    fn expiry_is_checked_before_usage() {
        let mut link = AppointmentLink::new(ID::default(), LinkPurpose::Confirm, HOUR, 0);
        link.used_ts = Some(10);
        assert_eq!(
            link.validate(LinkAction::Confirm, 2 * HOUR),
            Err(LinkValidationError::Expired)
        );
        assert_eq!(
            link.validate(LinkAction::Confirm, 10),
            Err(LinkValidationError::AlreadyUsed)
        );
    }

    #[test]
    fn rejects_confirm_on_cancel_link() {
        let link = AppointmentLink::new(ID::default(), LinkPurpose::Cancel, HOUR, 0);
        assert_eq!(
            link.validate(LinkAction::Confirm, 0),
            Err(LinkValidationError::InvalidAction {
                purpose: LinkPurpose::Cancel,
                action: LinkAction::Confirm
            })
        );
    }

    #[test]
    fn actions_map_to_terminal_statuses() {
        assert_eq!(
            LinkAction::Confirm.target_status(),
            AppointmentStatus::Confirmed
        );
        assert_eq!(
            LinkAction::Cancel.target_status(),
            AppointmentStatus::Canceled
        );
    }
}
