mod inmemory;
mod postgres;

use barbershop_booking_domain::{AppointmentLink, ID};
pub use inmemory::InMemoryAppointmentLinkRepo;
pub use postgres::PostgresAppointmentLinkRepo;

#[async_trait::async_trait]
pub trait IAppointmentLinkRepo: Send + Sync {
    async fn insert(&self, link: &AppointmentLink) -> anyhow::Result<()>;
    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<AppointmentLink>>;
    async fn find_by_appointment(&self, appointment_id: &ID)
        -> anyhow::Result<Vec<AppointmentLink>>;
}
