mod inmemory;
mod postgres;

use barbershop_booking_domain::{Appointment, AppointmentStatus, TimeSpan, ID};
pub use inmemory::InMemoryAppointmentRepo;
pub use postgres::PostgresAppointmentRepo;

/// Result of `IAppointmentRepo::resolve_with_link`
#[derive(Debug, Clone, PartialEq)]
pub enum LinkResolution {
    Resolved,
    /// The link was used by someone else. Nothing was written.
    LinkAlreadyUsed,
    /// The appointment was not in the expected status anymore. Carries the
    /// stored status, `None` if the appointment is gone. Nothing was written.
    AppointmentAlreadyProcessed(Option<AppointmentStatus>),
}

#[async_trait::async_trait]
pub trait IAppointmentRepo: Send + Sync {
    async fn insert(&self, appointment: &Appointment) -> anyhow::Result<()>;
    async fn find(&self, appointment_id: &ID) -> anyhow::Result<Option<Appointment>>;
    /// Claims the link (only if it is unused), moves the appointment from
    /// `from` to `to` (only if it is still `from`) and marks every other
    /// unused link of the appointment as used. Either all of it is written
    /// or nothing is.
    async fn resolve_with_link(
        &self,
        link_id: &ID,
        appointment_id: &ID,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: i64,
    ) -> anyhow::Result<LinkResolution>;
    /// Appointments in the given status whose start falls inside `span`
    async fn find_by_status_starting_in(
        &self,
        status: AppointmentStatus,
        span: &TimeSpan,
    ) -> anyhow::Result<Vec<Appointment>>;
}
