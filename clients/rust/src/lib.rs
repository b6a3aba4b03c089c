mod appointment;
mod base;
mod reminder;
mod status;
mod subscription;

use appointment::AppointmentClient;
pub use appointment::ResolveTokenInput;
pub(crate) use base::BaseClient;
pub use base::{APIError, APIErrorVariant, APIResponse};
pub use barbershop_booking_api_structs::dispatch_push_reminders::{HorizonResult, HorizonResults};
pub use barbershop_booking_api_structs::ErrorResponse;
pub use barbershop_booking_domain::{AppointmentStatus, LinkAction, SubscriptionAccess, ID};
use reminder::ReminderClient;
use status::StatusClient;
use std::sync::Arc;
use subscription::SubscriptionClient;

/// Barbershop Booking SDK
///
/// The SDK contains methods for interacting with the barbershop booking
/// core API.
#[derive(Clone)]
pub struct BarberSDK {
    pub appointment: AppointmentClient,
    pub reminder: ReminderClient,
    pub status: StatusClient,
    pub subscription: SubscriptionClient,
}

impl BarberSDK {
    pub fn new(address: String) -> Self {
        let base = Arc::new(BaseClient::new(address));
        Self {
            appointment: AppointmentClient::new(base.clone()),
            reminder: ReminderClient::new(base.clone()),
            status: StatusClient::new(base.clone()),
            subscription: SubscriptionClient::new(base),
        }
    }
}
