use barbershop_booking_domain::ID;
use barbershop_booking_infra::{
    BarberContext, BillingError, IBillingProvider, INotificationSender, NotificationError,
    StaticTimeSys,
};
use std::sync::{Arc, Mutex};

/// 2021-02-21 10:00:00 UTC
pub const NOW: i64 = 1613901600000;
pub const MINUTE: i64 = 1000 * 60;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;

/// Records every notification and fails for the appointments it is told to
#[derive(Default)]
pub struct FakeNotificationSender {
    pub sent: Mutex<Vec<(String, ID)>>,
    pub failing: Mutex<Vec<ID>>,
}

impl FakeNotificationSender {
    pub fn fail_for(&self, appointment_id: ID) {
        self.failing.lock().unwrap().push(appointment_id);
    }

    pub fn sent(&self) -> Vec<(String, ID)> {
        self.sent.lock().unwrap().clone()
    }

    fn deliver(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError> {
        if self.failing.lock().unwrap().contains(appointment_id) {
            return Err(NotificationError::TransportFailure(
                "503 Service Unavailable".into(),
            ));
        }
        self.sent
            .lock()
            .unwrap()
            .push((kind.to_string(), *appointment_id));
        Ok(())
    }
}

#[async_trait::async_trait]
impl INotificationSender for FakeNotificationSender {
    async fn send_email(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError> {
        self.deliver(kind, appointment_id)
    }

    async fn send_push(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError> {
        self.deliver(kind, appointment_id)
    }
}

pub fn setup_context(notifications: Arc<FakeNotificationSender>) -> BarberContext {
    let mut ctx = BarberContext::create_inmemory();
    ctx.sys = Arc::new(StaticTimeSys(NOW));
    ctx.notifications = notifications;
    ctx.billing = None;
    ctx
}

/// Billing provider answering from a fixed list of subscriptions
pub struct FakeBillingProvider {
    pub authenticates: bool,
    pub subscriptions: Vec<(String, barbershop_booking_domain::ProviderSubscription)>,
}

#[async_trait::async_trait]
impl IBillingProvider for FakeBillingProvider {
    async fn get_access_token(&self) -> Result<String, BillingError> {
        if self.authenticates {
            Ok("access-token".into())
        } else {
            Err(BillingError::Authentication("401 Unauthorized".into()))
        }
    }

    async fn get_subscription(
        &self,
        _access_token: &str,
        external_subscription_id: &str,
    ) -> Result<barbershop_booking_domain::ProviderSubscription, BillingError> {
        self.subscriptions
            .iter()
            .find(|(id, _)| id == external_subscription_id)
            .map(|(_, sub)| sub.clone())
            .ok_or_else(|| BillingError::Request("404 Not Found".into()))
    }
}
