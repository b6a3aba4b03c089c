use crate::{APIResponse, BaseClient};
use barbershop_booking_api_structs::*;
use barbershop_booking_domain::LinkAction;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppointmentClient {
    base: Arc<BaseClient>,
}

pub struct ResolveTokenInput {
    pub token: String,
    pub action: LinkAction,
}

impl AppointmentClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn resolve_token(
        &self,
        input: ResolveTokenInput,
    ) -> APIResponse<resolve_appointment_token::APIResponse> {
        let body = resolve_appointment_token::RequestBody {
            token: input.token,
            action: input.action,
        };
        self.base
            .post(body, "appointments/resolve-token".into(), StatusCode::OK)
            .await
    }
}
