mod paypal;

use barbershop_booking_domain::ProviderSubscription;
pub use paypal::PayPalBillingProvider;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Unable to authenticate with the billing provider: {0}")]
    Authentication(String),
    #[error("Billing provider request failed: {0}")]
    Request(String),
    #[error("Unexpected billing provider response: {0}")]
    UnexpectedResponse(String),
}

/// The external system that charges barbershops for their plan
#[async_trait::async_trait]
pub trait IBillingProvider: Send + Sync {
    /// Exchanges the client credentials for a bearer token. Called once per
    /// reconciliation run.
    async fn get_access_token(&self) -> Result<String, BillingError>;
    async fn get_subscription(
        &self,
        access_token: &str,
        external_subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError>;
}
