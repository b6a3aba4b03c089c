use super::IAppointmentLinkRepo;
use crate::repos::shared::inmemory_repo::*;
use barbershop_booking_domain::{AppointmentLink, ID};
use std::sync::{Arc, Mutex};

pub struct InMemoryAppointmentLinkRepo {
    links: Arc<Mutex<Vec<AppointmentLink>>>,
}

impl InMemoryAppointmentLinkRepo {
    pub fn new(links: Arc<Mutex<Vec<AppointmentLink>>>) -> Self {
        Self { links }
    }
}

#[async_trait::async_trait]
impl IAppointmentLinkRepo for InMemoryAppointmentLinkRepo {
    async fn insert(&self, link: &AppointmentLink) -> anyhow::Result<()> {
        insert(link, &self.links);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<AppointmentLink>> {
        Ok(find_by(&self.links, |l| l.token == token).into_iter().next())
    }

    async fn find_by_appointment(
        &self,
        appointment_id: &ID,
    ) -> anyhow::Result<Vec<AppointmentLink>> {
        Ok(find_by(&self.links, |l| l.appointment_id == *appointment_id))
    }
}
