use crate::{APIResponse, BaseClient};
use barbershop_booking_api_structs::*;
use barbershop_booking_domain::ID;
use reqwest::StatusCode;
use std::sync::Arc;

#[derive(Clone)]
pub struct SubscriptionClient {
    base: Arc<BaseClient>,
}

impl SubscriptionClient {
    pub(crate) fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    pub async fn reconcile(&self) -> APIResponse<reconcile_subscriptions::APIResponse> {
        self.base
            .trigger("subscriptions/reconcile".into(), StatusCode::OK)
            .await
    }

    pub async fn get_access(
        &self,
        barbershop_id: ID,
    ) -> APIResponse<get_subscription_access::APIResponse> {
        self.base
            .get(
                format!("barbershops/{}/subscription/access", barbershop_id),
                StatusCode::OK,
            )
            .await
    }
}
