use super::IAppointmentLinkRepo;
use barbershop_booking_domain::{AppointmentLink, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresAppointmentLinkRepo {
    pool: PgPool,
}

impl PostgresAppointmentLinkRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AppointmentLinkRaw {
    link_uid: Uuid,
    appointment_uid: Uuid,
    token: String,
    purpose: String,
    expires_ts: i64,
    used_ts: Option<i64>,
}

impl TryFrom<AppointmentLinkRaw> for AppointmentLink {
    type Error = anyhow::Error;

    fn try_from(e: AppointmentLinkRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.link_uid.into(),
            appointment_id: e.appointment_uid.into(),
            token: e.token,
            purpose: e.purpose.parse()?,
            expires_ts: e.expires_ts,
            used_ts: e.used_ts,
        })
    }
}

#[async_trait::async_trait]
impl IAppointmentLinkRepo for PostgresAppointmentLinkRepo {
    async fn insert(&self, link: &AppointmentLink) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointment_links(link_uid, appointment_uid, token, purpose, expires_ts, used_ts)
            VALUES($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(link.id.inner_ref())
        .bind(link.appointment_id.inner_ref())
        .bind(&link.token)
        .bind(link.purpose.as_str())
        .bind(link.expires_ts)
        .bind(link.used_ts)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert link for appointment: {:?}. DB returned error: {:?}",
                link.appointment_id, e
            );
            e
        })?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<AppointmentLink>> {
        let res: Option<AppointmentLinkRaw> = sqlx::query_as(
            r#"
            SELECT * FROM appointment_links
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Find link by token failed. DB returned error: {:?}", e);
            e
        })?;
        res.map(AppointmentLink::try_from).transpose()
    }

    async fn find_by_appointment(
        &self,
        appointment_id: &ID,
    ) -> anyhow::Result<Vec<AppointmentLink>> {
        let links: Vec<AppointmentLinkRaw> = sqlx::query_as(
            r#"
            SELECT * FROM appointment_links
            WHERE appointment_uid = $1
            "#,
        )
        .bind(appointment_id.inner_ref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find links for appointment: {:?} failed. DB returned error: {:?}",
                appointment_id, e
            );
            e
        })?;
        links.into_iter().map(AppointmentLink::try_from).collect()
    }
}
