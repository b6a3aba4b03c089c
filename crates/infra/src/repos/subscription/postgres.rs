use super::ISubscriptionRepo;
use barbershop_booking_domain::{Subscription, ID, TRIAL_EXPIRED};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::TryFrom;
use tracing::error;

pub struct PostgresSubscriptionRepo {
    pool: PgPool,
}

impl PostgresSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRaw {
    subscription_uid: Uuid,
    barbershop_uid: Uuid,
    status: String,
    trial_ends_ts: Option<i64>,
    current_period_end_ts: Option<i64>,
    external_subscription_id: Option<String>,
    last_payment_status: Option<String>,
}

impl TryFrom<SubscriptionRaw> for Subscription {
    type Error = anyhow::Error;

    fn try_from(e: SubscriptionRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.subscription_uid.into(),
            barbershop_id: e.barbershop_uid.into(),
            status: e.status.parse()?,
            trial_ends_ts: e.trial_ends_ts,
            current_period_end_ts: e.current_period_end_ts,
            external_subscription_id: e.external_subscription_id,
            last_payment_status: e.last_payment_status,
        })
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for PostgresSubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions
            (subscription_uid, barbershop_uid, status, trial_ends_ts, current_period_end_ts, external_subscription_id, last_payment_status)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subscription.id.inner_ref())
        .bind(subscription.barbershop_id.inner_ref())
        .bind(subscription.status.as_str())
        .bind(subscription.trial_ends_ts)
        .bind(subscription.current_period_end_ts)
        .bind(&subscription.external_subscription_id)
        .bind(&subscription.last_payment_status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to insert subscription: {:?}. DB returned error: {:?}",
                subscription, e
            );
            e
        })?;
        Ok(())
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2,
                trial_ends_ts = $3,
                current_period_end_ts = $4,
                external_subscription_id = $5,
                last_payment_status = $6
            WHERE subscription_uid = $1
            "#,
        )
        .bind(subscription.id.inner_ref())
        .bind(subscription.status.as_str())
        .bind(subscription.trial_ends_ts)
        .bind(subscription.current_period_end_ts)
        .bind(&subscription.external_subscription_id)
        .bind(&subscription.last_payment_status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to save subscription: {:?}. DB returned error: {:?}",
                subscription, e
            );
            e
        })?;
        Ok(())
    }

    async fn find(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>> {
        let res: Option<SubscriptionRaw> = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE subscription_uid = $1
            "#,
        )
        .bind(subscription_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find subscription with id: {:?} failed. DB returned error: {:?}",
                subscription_id, e
            );
            e
        })?;
        res.map(Subscription::try_from).transpose()
    }

    async fn find_by_barbershop(
        &self,
        barbershop_id: &ID,
    ) -> anyhow::Result<Option<Subscription>> {
        let res: Option<SubscriptionRaw> = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE barbershop_uid = $1
            "#,
        )
        .bind(barbershop_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find subscription for barbershop: {:?} failed. DB returned error: {:?}",
                barbershop_id, e
            );
            e
        })?;
        res.map(Subscription::try_from).transpose()
    }

    async fn expire_trials(&self, now: i64) -> anyhow::Result<Vec<Subscription>> {
        let expired: Vec<SubscriptionRaw> = sqlx::query_as(
            r#"
            UPDATE subscriptions
            SET status = 'past_due',
                last_payment_status = $2
            WHERE status = 'trial' AND trial_ends_ts < $1
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(TRIAL_EXPIRED)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Expiring trials failed. DB returned error: {:?}", e);
            e
        })?;
        expired.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_reconcilable(&self) -> anyhow::Result<Vec<Subscription>> {
        let subscriptions: Vec<SubscriptionRaw> = sqlx::query_as(
            r#"
            SELECT * FROM subscriptions
            WHERE status IN ('trial', 'active', 'past_due')
                AND external_subscription_id IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Find reconcilable subscriptions failed. DB returned error: {:?}",
                e
            );
            e
        })?;
        subscriptions
            .into_iter()
            .map(Subscription::try_from)
            .collect()
    }
}
