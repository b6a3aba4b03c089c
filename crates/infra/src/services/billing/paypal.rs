use super::{BillingError, IBillingProvider};
use barbershop_booking_domain::ProviderSubscription;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::error;

// https://developer.paypal.com/docs/api/subscriptions/v1/#subscriptions_get

pub struct PayPalBillingProvider {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct LastPayment {
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BillingInfo {
    next_billing_time: Option<String>,
    last_payment: Option<LastPayment>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    status: String,
    billing_info: Option<BillingInfo>,
}

fn parse_time(time: Option<&String>) -> Result<Option<i64>, BillingError> {
    time.map(|t| {
        DateTime::parse_from_rfc3339(t)
            .map(|dt| dt.timestamp_millis())
            .map_err(|e| BillingError::UnexpectedResponse(format!("Invalid time {}: {}", t, e)))
    })
    .transpose()
}

impl TryFrom<SubscriptionResponse> for ProviderSubscription {
    type Error = BillingError;

    fn try_from(res: SubscriptionResponse) -> Result<Self, Self::Error> {
        let (next_billing_ts, last_payment_ts) = match &res.billing_info {
            Some(info) => (
                parse_time(info.next_billing_time.as_ref())?,
                parse_time(info.last_payment.as_ref().and_then(|p| p.time.as_ref()))?,
            ),
            None => (None, None),
        };
        Ok(Self {
            status: res.status,
            next_billing_ts,
            last_payment_ts,
        })
    }
}

impl PayPalBillingProvider {
    pub fn new(base_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        }
    }
}

#[async_trait::async_trait]
impl IBillingProvider for PayPalBillingProvider {
    async fn get_access_token(&self) -> Result<String, BillingError> {
        let params = [("grant_type", "client_credentials")];
        let res = self
            .client
            .post(&format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("[Network Error] Billing token exchange failed: {:?}", e);
                BillingError::Authentication(e.to_string())
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(BillingError::Authentication(format!("{}: {}", status, text)));
        }

        res.json::<AccessTokenResponse>()
            .await
            .map(|res| res.access_token)
            .map_err(|e| BillingError::Authentication(e.to_string()))
    }

    async fn get_subscription(
        &self,
        access_token: &str,
        external_subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        let res = self
            .client
            .get(&format!(
                "{}/v1/billing/subscriptions/{}",
                self.base_url, external_subscription_id
            ))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "[Network Error] Billing subscription lookup failed. Error message: {:?}",
                    e
                );
                BillingError::Request(e.to_string())
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(BillingError::Request(format!("{}: {}", status, text)));
        }

        let body = res.json::<SubscriptionResponse>().await.map_err(|e| {
            error!(
                "[Unexpected Response] Billing subscription lookup error. Error message: {:?}",
                e
            );
            BillingError::UnexpectedResponse(e.to_string())
        })?;
        ProviderSubscription::try_from(body)
    }
}
