mod appointment;
mod appointment_link;
mod reminder;
mod shared;
mod subscription;
mod subscription_access;
mod timespan;

pub use appointment::{Appointment, AppointmentStatus, InvalidTransition};
pub use appointment_link::{AppointmentLink, LinkAction, LinkPurpose, LinkValidationError};
pub use chrono_tz::Tz;
pub use reminder::{ReminderHorizon, ReminderQueueEntry, ReminderStatus, RetryPolicy};
pub use shared::entity::{Entity, ID};
pub use subscription::{
    ProviderSubscription, ProviderSubscriptionStatus, Subscription, SubscriptionStatus,
    TRIAL_EXPIRED,
};
pub use subscription_access::SubscriptionAccess;
pub use timespan::TimeSpan;
