use barbershop_booking_domain::{AppointmentStatus, LinkAction};
use serde::{Deserialize, Serialize};

pub mod resolve_appointment_token {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub token: String,
        pub action: LinkAction,
    }

    #[derive(Debug, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub success: bool,
        pub action: LinkAction,
        /// Status of the appointment after the action was applied
        pub status: AppointmentStatus,
        pub message: String,
    }

    impl APIResponse {
        pub fn new(action: LinkAction, status: AppointmentStatus) -> Self {
            let message = match action {
                LinkAction::Confirm => "The appointment has been confirmed",
                LinkAction::Cancel => "The appointment has been canceled",
            };
            Self {
                success: true,
                action,
                status,
                message: message.into(),
            }
        }
    }
}
