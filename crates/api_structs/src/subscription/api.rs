use barbershop_booking_domain::{SubscriptionAccess, ID};
use serde::{Deserialize, Serialize};

pub mod reconcile_subscriptions {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub success: bool,
        pub expired_trials: usize,
        pub reconciled: usize,
        pub failed: usize,
    }
}

pub mod get_subscription_access {
    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    pub struct PathParams {
        pub barbershop_id: ID,
    }

    pub type APIResponse = SubscriptionAccess;
}
