use super::{IAppointmentRepo, LinkResolution};
use crate::repos::shared::inmemory_repo::*;
use barbershop_booking_domain::{Appointment, AppointmentLink, AppointmentStatus, TimeSpan, ID};
use std::sync::{Arc, Mutex};

pub struct InMemoryAppointmentRepo {
    appointments: Mutex<Vec<Appointment>>,
    /// Shared with the `InMemoryAppointmentLinkRepo`
    links: Arc<Mutex<Vec<AppointmentLink>>>,
}

impl InMemoryAppointmentRepo {
    pub fn new(links: Arc<Mutex<Vec<AppointmentLink>>>) -> Self {
        Self {
            appointments: Mutex::new(Vec::new()),
            links,
        }
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for InMemoryAppointmentRepo {
    async fn insert(&self, appointment: &Appointment) -> anyhow::Result<()> {
        insert(appointment, &self.appointments);
        Ok(())
    }

    async fn find(&self, appointment_id: &ID) -> anyhow::Result<Option<Appointment>> {
        Ok(find(appointment_id, &self.appointments))
    }

    async fn resolve_with_link(
        &self,
        link_id: &ID,
        appointment_id: &ID,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: i64,
    ) -> anyhow::Result<LinkResolution> {
        // Appointments before links, both held until everything is written
        let mut appointments = self.appointments.lock().unwrap();
        let mut links = self.links.lock().unwrap();

        let link_unused = links
            .iter()
            .any(|l| l.id == *link_id && l.used_ts.is_none());
        if !link_unused {
            return Ok(LinkResolution::LinkAlreadyUsed);
        }

        let appointment = match appointments.iter_mut().find(|a| a.id == *appointment_id) {
            Some(appointment) if appointment.status == from => appointment,
            other => {
                return Ok(LinkResolution::AppointmentAlreadyProcessed(
                    other.map(|a| a.status),
                ))
            }
        };
        appointment.status = to;

        for link in links.iter_mut().filter(|l| {
            l.used_ts.is_none() && (l.id == *link_id || l.appointment_id == *appointment_id)
        }) {
            link.used_ts = Some(now);
        }

        Ok(LinkResolution::Resolved)
    }

    async fn find_by_status_starting_in(
        &self,
        status: AppointmentStatus,
        span: &TimeSpan,
    ) -> anyhow::Result<Vec<Appointment>> {
        Ok(find_by(&self.appointments, |a| {
            a.status == status && span.contains(a.start_ts)
        }))
    }
}
