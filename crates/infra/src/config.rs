use barbershop_booking_domain::{RetryPolicy, Tz};
use std::str::FromStr;
use tracing::{info, warn};

const DEFAULT_BILLING_API_BASE_URL: &str = "https://api-m.paypal.com";

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Timezone in which the barbershop business days are counted
    pub business_timezone: Tz,
    /// Maximum number of queued reminders handled by one dispatch run
    pub reminder_batch_size: i64,
    /// A queued reminder that failed this many times is not retried again
    pub reminder_max_attempts: i64,
    /// Wait before the first retry of a failed reminder. Doubled for every
    /// further attempt.
    pub reminder_retry_backoff_millis: i64,
    pub notifications: NotificationsConfig,
    /// `None` when no billing credentials are present
    pub billing: Option<BillingConfig>,
}

#[derive(Debug, Clone)]
pub struct NotificationsConfig {
    pub email_url: Option<String>,
    pub push_url: Option<String>,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub api_base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> T
where
    T: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    key, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_url_env(key: &str) -> Option<String> {
    let value = std::env::var(key).ok().filter(|v| !v.trim().is_empty())?;
    match url::Url::parse(&value) {
        Ok(_) => Some(value),
        Err(e) => {
            warn!("The given {}: {} is not a valid url: {}.", key, value, e);
            None
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let port = parse_env_or("PORT", 5000);
        let business_timezone = parse_env_or("BUSINESS_TIMEZONE", Tz::UTC);
        let mut reminder_batch_size = parse_env_or("REMINDER_BATCH_SIZE", 50);
        if reminder_batch_size <= 0 {
            warn!("REMINDER_BATCH_SIZE has to be positive, falling back to 50.");
            reminder_batch_size = 50;
        }
        let mut reminder_max_attempts = parse_env_or("REMINDER_MAX_ATTEMPTS", 5);
        if reminder_max_attempts <= 0 {
            warn!("REMINDER_MAX_ATTEMPTS has to be positive, falling back to 5.");
            reminder_max_attempts = 5;
        }
        let reminder_retry_backoff_secs: i64 = parse_env_or("REMINDER_RETRY_BACKOFF_SECS", 300);

        let notifications = NotificationsConfig {
            email_url: parse_url_env("NOTIFICATIONS_EMAIL_URL"),
            push_url: parse_url_env("NOTIFICATIONS_PUSH_URL"),
            api_key: std::env::var("NOTIFICATIONS_API_KEY").unwrap_or_default(),
        };
        if notifications.email_url.is_none() {
            warn!("NOTIFICATIONS_EMAIL_URL is not set, queued reminders will fail to send.");
        }
        if notifications.push_url.is_none() {
            warn!("NOTIFICATIONS_PUSH_URL is not set, push reminders will fail to send.");
        }

        let billing = match (
            std::env::var("BILLING_CLIENT_ID"),
            std::env::var("BILLING_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret)) => Some(BillingConfig {
                api_base_url: parse_url_env("BILLING_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BILLING_API_BASE_URL.into()),
                client_id,
                client_secret,
            }),
            _ => {
                info!("Billing credentials are not set, subscriptions will only be reconciled locally.");
                None
            }
        };

        Self {
            port,
            business_timezone,
            reminder_batch_size,
            reminder_max_attempts,
            reminder_retry_backoff_millis: reminder_retry_backoff_secs.max(0) * 1000,
            notifications,
            billing,
        }
    }

    pub fn reminder_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.reminder_max_attempts,
            base_backoff_millis: self.reminder_retry_backoff_millis,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
