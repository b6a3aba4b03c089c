use crate::error::BarberError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use barbershop_booking_api_structs::reconcile_subscriptions::APIResponse;
use barbershop_booking_domain::Subscription;
use barbershop_booking_infra::{BarberContext, BillingError, IBillingProvider};
use tracing::{info, warn};

pub async fn reconcile_subscriptions_controller(
    ctx: web::Data<BarberContext>,
) -> Result<HttpResponse, BarberError> {
    let usecase = ReconcileSubscriptionsUseCase;

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(res))
        .map_err(BarberError::from)
}

/// Brings the stored subscriptions up to date.
///
/// First every trial that has run out is moved to `past_due`. Then, when a
/// billing provider is configured, every live subscription with an external
/// id is synced with the provider.
#[derive(Debug)]
pub struct ReconcileSubscriptionsUseCase;

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
    BillingAuthentication(BillingError),
}

impl From<UseCaseError> for BarberError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
            UseCaseError::BillingAuthentication(_) => Self::InternalError,
        }
    }
}

#[derive(Debug, Default)]
struct ExternalSummary {
    reconciled: usize,
    failed: usize,
}

#[derive(Debug)]
enum ReconcileError {
    Billing(BillingError),
    Storage(anyhow::Error),
    /// The subscription disappeared or lost its external id in the meantime
    Gone,
}

async fn reconcile_one(
    subscription: &Subscription,
    external_id: &str,
    access_token: &str,
    billing: &dyn IBillingProvider,
    ctx: &BarberContext,
) -> Result<(), ReconcileError> {
    let provider_state = billing
        .get_subscription(access_token, external_id)
        .await
        .map_err(ReconcileError::Billing)?;

    let mut current = ctx
        .repos
        .subscriptions
        .find(&subscription.id)
        .await
        .map_err(ReconcileError::Storage)?
        .filter(|s| s.external_subscription_id.as_deref() == Some(external_id))
        .ok_or(ReconcileError::Gone)?;

    current.apply_provider_state(&provider_state, ctx.sys.get_timestamp_millis());
    ctx.repos
        .subscriptions
        .save(&current)
        .await
        .map_err(ReconcileError::Storage)
}

async fn reconcile_external(
    billing: &dyn IBillingProvider,
    ctx: &BarberContext,
) -> Result<ExternalSummary, UseCaseError> {
    let subscriptions = ctx
        .repos
        .subscriptions
        .find_reconcilable()
        .await
        .map_err(|_| UseCaseError::StorageError)?;
    let mut summary = ExternalSummary::default();
    if subscriptions.is_empty() {
        return Ok(summary);
    }

    let access_token = billing
        .get_access_token()
        .await
        .map_err(UseCaseError::BillingAuthentication)?;

    for subscription in subscriptions {
        let external_id = match &subscription.external_subscription_id {
            Some(id) => id.clone(),
            None => continue,
        };
        match reconcile_one(&subscription, &external_id, &access_token, billing, ctx).await {
            Ok(()) => summary.reconciled += 1,
            Err(e) => {
                warn!(
                    "Unable to reconcile subscription {} of barbershop {}. Error: {:?}",
                    subscription.id, subscription.barbershop_id, e
                );
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

#[async_trait::async_trait(?Send)]
impl UseCase for ReconcileSubscriptionsUseCase {
    type Response = APIResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "ReconcileSubscriptions";

    async fn execute(&mut self, ctx: &BarberContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let expired = ctx
            .repos
            .subscriptions
            .expire_trials(now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if !expired.is_empty() {
            info!("Expired {} trial subscriptions", expired.len());
        }

        let external = match &ctx.billing {
            Some(billing) => reconcile_external(billing.as_ref(), ctx).await?,
            None => {
                warn!("No billing provider configured, skipping external reconciliation");
                ExternalSummary::default()
            }
        };

        Ok(APIResponse {
            success: true,
            expired_trials: expired.len(),
            reconciled: external.reconciled,
            failed: external.failed,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_helpers::{
        setup_context, FakeBillingProvider, FakeNotificationSender, DAY, NOW,
    };
    use barbershop_booking_domain::{ProviderSubscription, SubscriptionStatus, ID, TRIAL_EXPIRED};
    use std::sync::Arc;

    fn provider(status: &str, next: Option<i64>, last: Option<i64>) -> ProviderSubscription {
        ProviderSubscription {
            status: status.into(),
            next_billing_ts: next,
            last_payment_ts: last,
        }
    }

    fn external(external_id: &str, status: SubscriptionStatus) -> Subscription {
        let mut sub = Subscription::new_trial(ID::default(), NOW + DAY);
        sub.status = status;
        sub.external_subscription_id = Some(external_id.into());
        sub
    }

    async fn stored(ctx: &BarberContext, sub: &Subscription) -> Subscription {
        ctx.repos
            .subscriptions
            .find(&sub.id)
            .await
            .unwrap()
            .unwrap()
    }

    #[actix_web::main]
    #[test]
    async fn expires_trials_without_billing_provider() {
        let ctx = setup_context(Arc::new(FakeNotificationSender::default()));
        let overdue = Subscription::new_trial(ID::default(), NOW - DAY);
        let running = Subscription::new_trial(ID::default(), NOW + DAY);
        ctx.repos.subscriptions.insert(&overdue).await.unwrap();
        ctx.repos.subscriptions.insert(&running).await.unwrap();

        let res = ReconcileSubscriptionsUseCase.execute(&ctx).await.unwrap();
        assert_eq!(
            res,
            APIResponse {
                success: true,
                expired_trials: 1,
                reconciled: 0,
                failed: 0
            }
        );
        let overdue = stored(&ctx, &overdue).await;
        assert_eq!(overdue.status, SubscriptionStatus::PastDue);
        assert_eq!(overdue.last_payment_status.as_deref(), Some(TRIAL_EXPIRED));
        assert_eq!(stored(&ctx, &running).await.status, SubscriptionStatus::Trial);
    }

    #[actix_web::main]
    #[test]
    async fn syncs_with_billing_provider() {
        let mut ctx = setup_context(Arc::new(FakeNotificationSender::default()));
        let paying = external("I-PAYING", SubscriptionStatus::Trial);
        let suspended = external("I-SUSPENDED", SubscriptionStatus::Active);
        let unknown = external("I-UNKNOWN", SubscriptionStatus::Active);
        let mut canceled = external("I-CANCELED", SubscriptionStatus::Canceled);
        canceled.last_payment_status = Some("CANCELLED".into());
        // Expired locally and then skipped because it has no external id
        let local_trial = Subscription::new_trial(ID::default(), NOW - DAY);
        for sub in [&paying, &suspended, &unknown, &canceled, &local_trial] {
            ctx.repos.subscriptions.insert(sub).await.unwrap();
        }
        ctx.billing = Some(Arc::new(FakeBillingProvider {
            authenticates: true,
            subscriptions: vec![
                (
                    "I-PAYING".into(),
                    provider("ACTIVE", Some(NOW + 30 * DAY), Some(NOW - DAY)),
                ),
                ("I-SUSPENDED".into(), provider("SUSPENDED", None, None)),
                ("I-CANCELED".into(), provider("ACTIVE", None, None)),
            ],
        }));

        let res = ReconcileSubscriptionsUseCase.execute(&ctx).await.unwrap();
        assert_eq!(res.expired_trials, 1);
        assert_eq!(res.reconciled, 2);
        assert_eq!(res.failed, 1);

        let paying = stored(&ctx, &paying).await;
        assert_eq!(paying.status, SubscriptionStatus::Active);
        assert_eq!(paying.current_period_end_ts, Some(NOW + 30 * DAY));
        assert_eq!(paying.last_payment_status.as_deref(), Some("ACTIVE"));
        assert_eq!(
            stored(&ctx, &suspended).await.status,
            SubscriptionStatus::PastDue
        );
        assert_eq!(stored(&ctx, &unknown).await.status, SubscriptionStatus::Active);
        // Canceled subscriptions are not synced
        assert_eq!(
            stored(&ctx, &canceled).await.status,
            SubscriptionStatus::Canceled
        );
        let local_trial = stored(&ctx, &local_trial).await;
        assert_eq!(local_trial.status, SubscriptionStatus::PastDue);
        assert_eq!(local_trial.last_payment_status.as_deref(), Some(TRIAL_EXPIRED));
    }

    #[actix_web::main]
    #[test]
    async fn fails_when_billing_authentication_fails() {
        let mut ctx = setup_context(Arc::new(FakeNotificationSender::default()));
        let overdue = Subscription::new_trial(ID::default(), NOW - DAY);
        let sub = external("I-1", SubscriptionStatus::Active);
        ctx.repos.subscriptions.insert(&overdue).await.unwrap();
        ctx.repos.subscriptions.insert(&sub).await.unwrap();
        ctx.billing = Some(Arc::new(FakeBillingProvider {
            authenticates: false,
            subscriptions: vec![],
        }));

        let res = ReconcileSubscriptionsUseCase.execute(&ctx).await;
        assert!(matches!(res, Err(UseCaseError::BillingAuthentication(_))));
        // The local pass is already committed
        assert_eq!(
            stored(&ctx, &overdue).await.status,
            SubscriptionStatus::PastDue
        );
    }
}
