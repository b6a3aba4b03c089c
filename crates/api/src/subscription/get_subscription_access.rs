use crate::error::BarberError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use barbershop_booking_api_structs::get_subscription_access::*;
use barbershop_booking_domain::{SubscriptionAccess, ID};
use barbershop_booking_infra::BarberContext;

pub async fn get_subscription_access_controller(
    path_params: web::Path<PathParams>,
    ctx: web::Data<BarberContext>,
) -> Result<HttpResponse, BarberError> {
    let usecase = GetSubscriptionAccessUseCase {
        barbershop_id: path_params.barbershop_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|access| HttpResponse::Ok().json(access))
        .map_err(BarberError::from)
}

#[derive(Debug)]
pub struct GetSubscriptionAccessUseCase {
    pub barbershop_id: ID,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for BarberError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetSubscriptionAccessUseCase {
    type Response = APIResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "GetSubscriptionAccess";

    async fn execute(&mut self, ctx: &BarberContext) -> Result<Self::Response, Self::Error> {
        let subscription = ctx
            .repos
            .subscriptions
            .find_by_barbershop(&self.barbershop_id)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(SubscriptionAccess::evaluate(
            subscription.as_ref(),
            ctx.sys.get_timestamp_millis(),
            &ctx.config.business_timezone,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_helpers::{setup_context, FakeNotificationSender, DAY, NOW};
    use barbershop_booking_domain::Subscription;
    use std::sync::Arc;

    #[actix_web::main]
    #[test]
    async fn evaluates_stored_subscription() {
        let ctx = setup_context(Arc::new(FakeNotificationSender::default()));
        let subscription = Subscription::new_trial(ID::default(), NOW + 2 * DAY);
        ctx.repos.subscriptions.insert(&subscription).await.unwrap();

        let mut usecase = GetSubscriptionAccessUseCase {
            barbershop_id: subscription.barbershop_id,
        };
        let access = usecase.execute(&ctx).await.unwrap();
        assert!(access.is_trial);
        assert!(access.can_write);
        assert_eq!(access.trial_days_remaining, Some(2));
    }

    #[actix_web::main]
    #[test]
    async fn missing_subscription_requires_payment() {
        let ctx = setup_context(Arc::new(FakeNotificationSender::default()));

        let mut usecase = GetSubscriptionAccessUseCase {
            barbershop_id: ID::default(),
        };
        let access = usecase.execute(&ctx).await.unwrap();
        assert!(access.is_payment_required);
        assert!(!access.can_write);
    }
}
