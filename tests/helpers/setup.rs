use barbershop_booking_api::Application;
use barbershop_booking_domain::ID;
use barbershop_booking_infra::{
    BarberContext, INotificationSender, NotificationError, StaticTimeSys,
};
use barbershop_booking_sdk::BarberSDK;
use std::sync::{Arc, Mutex};

/// 2021-02-21 10:00:00 UTC
pub const NOW: i64 = 1613901600000;

/// Collects notifications instead of calling the email and push functions
#[derive(Default)]
pub struct RecordingNotificationSender {
    pub emails: Mutex<Vec<(String, ID)>>,
    pub pushes: Mutex<Vec<(String, ID)>>,
}

#[async_trait::async_trait]
impl INotificationSender for RecordingNotificationSender {
    async fn send_email(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError> {
        self.emails
            .lock()
            .unwrap()
            .push((kind.to_string(), *appointment_id));
        Ok(())
    }

    async fn send_push(&self, kind: &str, appointment_id: &ID) -> Result<(), NotificationError> {
        self.pushes
            .lock()
            .unwrap()
            .push((kind.to_string(), *appointment_id));
        Ok(())
    }
}

pub struct TestApp {
    pub ctx: BarberContext,
    pub notifications: Arc<RecordingNotificationSender>,
}

// Launch the application as a background task
pub async fn spawn_app() -> (TestApp, BarberSDK, String) {
    let notifications = Arc::new(RecordingNotificationSender::default());
    let mut ctx = BarberContext::create_inmemory();
    ctx.config.port = 0; // Random port
    ctx.sys = Arc::new(StaticTimeSys(NOW));
    ctx.notifications = notifications.clone();
    ctx.billing = None;

    let application = Application::new(ctx.clone())
        .await
        .expect("Failed to build application.");

    let address = format!("http://localhost:{}/api/v1", application.port());
    let _ = actix_web::rt::spawn(async move {
        application
            .start()
            .await
            .expect("Expected application to start");
    });

    let app = TestApp { ctx, notifications };
    let sdk = BarberSDK::new(address.clone());
    (app, sdk, address)
}
