use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// An `Appointment` is a booked time slot at a barbershop.
///
/// It is created by the booking flow in the `Pending` state and afterwards
/// only changes state through `Appointment::transition`.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: ID,
    pub barbershop_id: ID,
    /// The barber assigned to the appointment, if any
    pub staff_user_id: Option<ID>,
    pub start_ts: i64,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Canceled,
}

#[derive(Error, Debug, PartialEq)]
#[error("Appointment cannot go from {from} to {to}")]
pub struct InvalidTransition {
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
}

#[derive(Error, Debug)]
#[error("Unknown appointment status: {0}")]
pub struct InvalidAppointmentStatus(String);

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Canceled => "canceled",
        }
    }

    /// `Confirmed` and `Canceled` are terminal, only `Pending` can move
    pub fn can_transition_to(&self, to: AppointmentStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Confirmed) | (Self::Pending, Self::Canceled)
        )
    }
}

impl Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = InvalidAppointmentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "canceled" => Ok(Self::Canceled),
            _ => Err(InvalidAppointmentStatus(s.to_string())),
        }
    }
}

impl Appointment {
    pub fn new(barbershop_id: ID, staff_user_id: Option<ID>, start_ts: i64) -> Self {
        Self {
            id: Default::default(),
            barbershop_id,
            staff_user_id,
            start_ts,
            status: AppointmentStatus::Pending,
        }
    }

    pub fn transition(&mut self, to: AppointmentStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

impl Entity for Appointment {
    fn id(&self) -> &ID {
        &self.id
    }
}
