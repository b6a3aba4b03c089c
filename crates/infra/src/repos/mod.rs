mod appointment;
mod appointment_link;
mod reminder_queue;
mod shared;
mod subscription;

pub use appointment::{IAppointmentRepo, LinkResolution};
use appointment::{InMemoryAppointmentRepo, PostgresAppointmentRepo};
pub use appointment_link::IAppointmentLinkRepo;
use appointment_link::{InMemoryAppointmentLinkRepo, PostgresAppointmentLinkRepo};
pub use reminder_queue::IReminderQueueRepo;
use reminder_queue::{InMemoryReminderQueueRepo, PostgresReminderQueueRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::{Arc, Mutex};
pub use subscription::ISubscriptionRepo;
use subscription::{InMemorySubscriptionRepo, PostgresSubscriptionRepo};
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub appointments: Arc<dyn IAppointmentRepo>,
    pub appointment_links: Arc<dyn IAppointmentLinkRepo>,
    pub reminder_queue: Arc<dyn IReminderQueueRepo>,
    pub subscriptions: Arc<dyn ISubscriptionRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            appointments: Arc::new(PostgresAppointmentRepo::new(pool.clone())),
            appointment_links: Arc::new(PostgresAppointmentLinkRepo::new(pool.clone())),
            reminder_queue: Arc::new(PostgresReminderQueueRepo::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        // Both repos see the same links so an appointment can be resolved
        // together with its links under one lock
        let links = Arc::new(Mutex::new(Vec::new()));
        Self {
            appointments: Arc::new(InMemoryAppointmentRepo::new(links.clone())),
            appointment_links: Arc::new(InMemoryAppointmentLinkRepo::new(links)),
            reminder_queue: Arc::new(InMemoryReminderQueueRepo::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepo::new()),
        }
    }
}
