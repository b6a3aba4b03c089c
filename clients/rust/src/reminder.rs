use crate::{APIResponse, BaseClient};
use barbershop_booking_api_structs::*;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReminderClient {
    base: Arc<BaseClient>,
}

impl ReminderClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn dispatch(&self) -> APIResponse<dispatch_reminders::APIResponse> {
        self.base
            .trigger("reminders/dispatch".into(), StatusCode::OK)
            .await
    }

    pub async fn dispatch_push(&self) -> APIResponse<dispatch_push_reminders::APIResponse> {
        self.base
            .trigger("reminders/push/dispatch".into(), StatusCode::OK)
            .await
    }
}
