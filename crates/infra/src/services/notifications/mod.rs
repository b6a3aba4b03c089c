use barbershop_booking_domain::ID;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug, PartialEq)]
pub enum NotificationError {
    #[error("{0} notifications are not configured")]
    NotConfigured(&'static str),
    #[error("{0}")]
    TransportFailure(String),
}

/// Delivers reminders to clients. Templates and addresses live on the
/// receiving side, we only name the message type and the appointment.
#[async_trait::async_trait]
pub trait INotificationSender: Send + Sync {
    async fn send_email(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError>;
    async fn send_push(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationPayload<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    appointment_id: String,
}

/// Posts notifications to the email and push functions over HTTP
pub struct HttpNotificationSender {
    client: Client,
    email_url: Option<String>,
    push_url: Option<String>,
    api_key: String,
}

impl HttpNotificationSender {
    pub fn new(email_url: Option<String>, push_url: Option<String>, api_key: String) -> Self {
        Self {
            client: Client::new(),
            email_url,
            push_url,
            api_key,
        }
    }

    async fn post(
        &self,
        url: &str,
        kind: &str,
        appointment_id: &ID,
    ) -> Result<(), NotificationError> {
        let payload = NotificationPayload {
            kind,
            appointment_id: appointment_id.as_string(),
        };
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("[Network Error] Notification POST error. Error message: {:?}", e);
                NotificationError::TransportFailure(e.to_string())
            })?;

        if res.status().is_success() {
            debug!("Delivered {} notification for appointment {}", kind, appointment_id);
            return Ok(());
        }
        let status = res.status();
        let text = res
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(NotificationError::TransportFailure(format!(
            "{}: {}",
            status, text
        )))
    }
}

#[async_trait::async_trait]
impl INotificationSender for HttpNotificationSender {
    async fn send_email(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError> {
        match &self.email_url {
            Some(url) => self.post(url, kind, appointment_id).await,
            None => Err(NotificationError::NotConfigured("Email")),
        }
    }

    async fn send_push(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError> {
        match &self.push_url {
            Some(url) => self.post(url, kind, appointment_id).await,
            None => Err(NotificationError::NotConfigured("Push")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_type_and_camel_case() {
        let id = ID::default();
        let payload = NotificationPayload {
            kind: "reminder_2h",
            appointment_id: id.as_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "reminder_2h");
        assert_eq!(json["appointmentId"], id.as_string());
    }

    #[tokio::test]
    async fn unconfigured_channels_fail() {
        let sender = HttpNotificationSender::new(None, None, String::new());
        let id = ID::default();
        assert_eq!(
            sender.send_email("reminder", &id).await,
            Err(NotificationError::NotConfigured("Email"))
        );
        assert_eq!(
            sender.send_push("reminder_30min", &id).await,
            Err(NotificationError::NotConfigured("Push"))
        );
    }
}
