use super::{IAppointmentRepo, LinkResolution};
use barbershop_booking_domain::{Appointment, AppointmentStatus, TimeSpan, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresAppointmentRepo {
    pool: PgPool,
}

impl PostgresAppointmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AppointmentRaw {
    appointment_uid: Uuid,
    barbershop_uid: Uuid,
    staff_user_uid: Option<Uuid>,
    start_ts: i64,
    status: String,
}

impl TryFrom<AppointmentRaw> for Appointment {
    type Error = anyhow::Error;

    fn try_from(e: AppointmentRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.appointment_uid.into(),
            barbershop_id: e.barbershop_uid.into(),
            staff_user_id: e.staff_user_uid.map(|id| id.into()),
            start_ts: e.start_ts,
            status: e.status.parse()?,
        })
    }
}

#[async_trait::async_trait]
impl IAppointmentRepo for PostgresAppointmentRepo {
    async fn insert(&self, appointment: &Appointment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments(appointment_uid, barbershop_uid, staff_user_uid, start_ts, status)
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(appointment.id.inner_ref())
        .bind(appointment.barbershop_id.inner_ref())
        .bind(appointment.staff_user_id.map(|id| id.inner()))
        .bind(appointment.start_ts)
        .bind(appointment.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert appointment: {:?}. DB returned error: {:?}",
                appointment, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, appointment_id: &ID) -> anyhow::Result<Option<Appointment>> {
        let res: Option<AppointmentRaw> = sqlx::query_as(
            r#"
            SELECT * FROM appointments
            WHERE appointment_uid = $1
            "#,
        )
        .bind(appointment_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find appointment with id: {:?} failed. DB returned error: {:?}",
                appointment_id, e
            );
            e
        })?;
        res.map(Appointment::try_from).transpose()
    }

    async fn resolve_with_link(
        &self,
        link_id: &ID,
        appointment_id: &ID,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: i64,
    ) -> anyhow::Result<LinkResolution> {
        let log_error = |e: sqlx::Error| {
            error!(
                "Resolving appointment: {:?} with link: {:?} failed. DB returned error: {:?}",
                appointment_id, link_id, e
            );
            e
        };
        let mut tx = self.pool.begin().await.map_err(log_error)?;

        let claimed = sqlx::query(
            r#"
            UPDATE appointment_links
            SET used_ts = $2
            WHERE link_uid = $1 AND used_ts IS NULL
            "#,
        )
        .bind(link_id.inner_ref())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(log_error)?;
        if claimed.rows_affected() != 1 {
            tx.rollback().await.map_err(log_error)?;
            return Ok(LinkResolution::LinkAlreadyUsed);
        }

        let transitioned = sqlx::query(
            r#"
            UPDATE appointments
            SET status = $3
            WHERE appointment_uid = $1 AND status = $2
            "#,
        )
        .bind(appointment_id.inner_ref())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&mut *tx)
        .await
        .map_err(log_error)?;
        if transitioned.rows_affected() != 1 {
            tx.rollback().await.map_err(log_error)?;
            let current = self.find(appointment_id).await?.map(|a| a.status);
            return Ok(LinkResolution::AppointmentAlreadyProcessed(current));
        }

        sqlx::query(
            r#"
            UPDATE appointment_links
            SET used_ts = $2
            WHERE appointment_uid = $1 AND used_ts IS NULL
            "#,
        )
        .bind(appointment_id.inner_ref())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(log_error)?;

        tx.commit().await.map_err(log_error)?;
        Ok(LinkResolution::Resolved)
    }

    async fn find_by_status_starting_in(
        &self,
        status: AppointmentStatus,
        span: &TimeSpan,
    ) -> anyhow::Result<Vec<Appointment>> {
        let appointments: Vec<AppointmentRaw> = sqlx::query_as(
            r#"
            SELECT * FROM appointments
            WHERE status = $1 AND start_ts >= $2 AND start_ts <= $3
            ORDER BY start_ts
            "#,
        )
        .bind(status.as_str())
        .bind(span.get_start())
        .bind(span.get_end())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find {} appointments in {:?} failed. DB returned error: {:?}",
                status, span, e
            );
            e
        })?;
        appointments.into_iter().map(Appointment::try_from).collect()
    }
}
