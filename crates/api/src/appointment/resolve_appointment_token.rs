use crate::error::BarberError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use barbershop_booking_api_structs::resolve_appointment_token::*;
use barbershop_booking_domain::{
    Appointment, AppointmentStatus, LinkAction, LinkPurpose, LinkValidationError, ID,
};
use barbershop_booking_infra::{BarberContext, LinkResolution};

pub async fn resolve_appointment_token_controller(
    body: web::Json<RequestBody>,
    ctx: web::Data<BarberContext>,
) -> Result<HttpResponse, BarberError> {
    let body = body.0;
    let action = body.action;
    let usecase = ResolveAppointmentTokenUseCase {
        token: body.token,
        action,
    };

    execute(usecase, &ctx)
        .await
        .map(|appointment| HttpResponse::Ok().json(APIResponse::new(action, appointment.status)))
        .map_err(BarberError::from)
}

/// Confirms or cancels a pending `Appointment` through one of its single use
/// links.
///
/// Claiming the link, transitioning the appointment and consuming the
/// sibling links is a single conditional write, so out of several concurrent
/// submissions for the same appointment only one can succeed and a failed
/// write leaves the link usable.
#[derive(Debug)]
pub struct ResolveAppointmentTokenUseCase {
    pub token: String,
    pub action: LinkAction,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidToken,
    Expired,
    AlreadyUsed,
    InvalidAction {
        purpose: LinkPurpose,
        action: LinkAction,
    },
    AppointmentNotFound(ID),
    AlreadyProcessed(AppointmentStatus),
    StorageError,
}

impl From<LinkValidationError> for UseCaseError {
    fn from(e: LinkValidationError) -> Self {
        match e {
            LinkValidationError::Expired => Self::Expired,
            LinkValidationError::AlreadyUsed => Self::AlreadyUsed,
            LinkValidationError::InvalidAction { purpose, action } => {
                Self::InvalidAction { purpose, action }
            }
        }
    }
}

impl From<UseCaseError> for BarberError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidToken => {
                Self::InvalidToken("The link is invalid or does not exist".into())
            }
            UseCaseError::Expired => Self::Expired("The link has expired".into()),
            UseCaseError::AlreadyUsed => {
                Self::AlreadyUsed("The link has already been used".into())
            }
            UseCaseError::InvalidAction { purpose, action } => Self::InvalidAction(format!(
                "A {} link can not be used to {} the appointment",
                purpose, action
            )),
            UseCaseError::AppointmentNotFound(appointment_id) => Self::NotFound(format!(
                "The appointment with id: {}, was not found.",
                appointment_id
            )),
            UseCaseError::AlreadyProcessed(status) => Self::AlreadyProcessed(format!(
                "The appointment has already been processed and is {}",
                status
            )),
            UseCaseError::StorageError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for ResolveAppointmentTokenUseCase {
    type Response = Appointment;

    type Error = UseCaseError;

    const NAME: &'static str = "ResolveAppointmentToken";

    async fn execute(&mut self, ctx: &BarberContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();

        let link = match ctx.repos.appointment_links.find_by_token(&self.token).await {
            Ok(Some(link)) => link,
            Ok(None) => return Err(UseCaseError::InvalidToken),
            Err(_) => return Err(UseCaseError::StorageError),
        };
        link.validate(self.action, now)?;

        let mut appointment = match ctx.repos.appointments.find(&link.appointment_id).await {
            Ok(Some(appointment)) => appointment,
            Ok(None) => return Err(UseCaseError::AppointmentNotFound(link.appointment_id)),
            Err(_) => return Err(UseCaseError::StorageError),
        };
        let target = self.action.target_status();
        appointment
            .transition(target)
            .map_err(|e| UseCaseError::AlreadyProcessed(e.from))?;

        match ctx
            .repos
            .appointments
            .resolve_with_link(
                &link.id,
                &appointment.id,
                AppointmentStatus::Pending,
                target,
                now,
            )
            .await
        {
            Ok(LinkResolution::Resolved) => Ok(appointment),
            Ok(LinkResolution::LinkAlreadyUsed) => Err(UseCaseError::AlreadyUsed),
            // Somebody else resolved the appointment after we read it
            Ok(LinkResolution::AppointmentAlreadyProcessed(Some(current))) => {
                Err(UseCaseError::AlreadyProcessed(current))
            }
            Ok(LinkResolution::AppointmentAlreadyProcessed(None)) => {
                Err(UseCaseError::AppointmentNotFound(appointment.id))
            }
            Err(_) => Err(UseCaseError::StorageError),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::test_helpers::{setup_context, FakeNotificationSender, HOUR, NOW};
    use barbershop_booking_domain::{AppointmentLink, TimeSpan};
    use barbershop_booking_infra::IAppointmentRepo;
    use std::sync::{Arc, Mutex};

    struct TestContext {
        ctx: BarberContext,
        appointment: Appointment,
        confirm: AppointmentLink,
        cancel: AppointmentLink,
    }

    async fn setup() -> TestContext {
        let ctx = setup_context(Arc::new(FakeNotificationSender::default()));
        let appointment = Appointment::new(ID::default(), None, NOW + 24 * HOUR);
        ctx.repos.appointments.insert(&appointment).await.unwrap();
        let [confirm, cancel] = AppointmentLink::issue_pair(appointment.id, HOUR, NOW);
        ctx.repos.appointment_links.insert(&confirm).await.unwrap();
        ctx.repos.appointment_links.insert(&cancel).await.unwrap();

        TestContext {
            ctx,
            appointment,
            confirm,
            cancel,
        }
    }

    async fn resolve(
        ctx: &BarberContext,
        token: &str,
        action: LinkAction,
    ) -> Result<Appointment, UseCaseError> {
        let mut usecase = ResolveAppointmentTokenUseCase {
            token: token.into(),
            action,
        };
        usecase.execute(ctx).await
    }

    #[actix_web::main]
    #[test]
    async fn confirms_appointment_and_consumes_all_links() {
        let TestContext {
            ctx,
            appointment,
            confirm,
            cancel,
        } = setup().await;

        let res = resolve(&ctx, &confirm.token, LinkAction::Confirm).await;
        assert_eq!(res.unwrap().status, AppointmentStatus::Confirmed);

        let stored = ctx
            .repos
            .appointments
            .find(&appointment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AppointmentStatus::Confirmed);

        let links = ctx
            .repos
            .appointment_links
            .find_by_appointment(&appointment.id)
            .await
            .unwrap();
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|l| l.used_ts == Some(NOW)));

        // The sibling cancel link can not be replayed
        assert_eq!(
            resolve(&ctx, &cancel.token, LinkAction::Cancel).await,
            Err(UseCaseError::AlreadyUsed)
        );
    }

    #[actix_web::main]
    #[test]
    async fn second_submission_fails() {
        let TestContext { ctx, confirm, .. } = setup().await;

        assert!(resolve(&ctx, &confirm.token, LinkAction::Confirm)
            .await
            .is_ok());
        assert_eq!(
            resolve(&ctx, &confirm.token, LinkAction::Confirm).await,
            Err(UseCaseError::AlreadyUsed)
        );
    }

    #[actix_web::main]
    #[test]
    async fn confirm_link_can_cancel() {
        let TestContext { ctx, confirm, .. } = setup().await;

        let res = resolve(&ctx, &confirm.token, LinkAction::Cancel).await;
        assert_eq!(res.unwrap().status, AppointmentStatus::Canceled);
    }

    #[actix_web::main]
    #[test]
    async fn cancel_link_can_not_confirm() {
        let TestContext {
            ctx,
            appointment,
            cancel,
            ..
        } = setup().await;

        assert_eq!(
            resolve(&ctx, &cancel.token, LinkAction::Confirm).await,
            Err(UseCaseError::InvalidAction {
                purpose: LinkPurpose::Cancel,
                action: LinkAction::Confirm
            })
        );
        let stored = ctx
            .repos
            .appointments
            .find(&appointment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AppointmentStatus::Pending);
    }

    #[actix_web::main]
    #[test]
    async fn rejects_unknown_token() {
        let TestContext { ctx, .. } = setup().await;

        assert_eq!(
            resolve(&ctx, "does-not-exist", LinkAction::Confirm).await,
            Err(UseCaseError::InvalidToken)
        );
        assert_eq!(
            resolve(&ctx, "", LinkAction::Confirm).await,
            Err(UseCaseError::InvalidToken)
        );
    }

    #[actix_web::main]
    #[test]
    async fn rejects_expired_link() {
        let TestContext { ctx, appointment, .. } = setup().await;
        let expired = AppointmentLink::new(appointment.id, LinkPurpose::Cancel, -HOUR, NOW);
        ctx.repos.appointment_links.insert(&expired).await.unwrap();

        assert_eq!(
            resolve(&ctx, &expired.token, LinkAction::Cancel).await,
            Err(UseCaseError::Expired)
        );
    }

    #[actix_web::main]
    #[test]
    async fn rejects_link_of_missing_appointment() {
        let TestContext { ctx, .. } = setup().await;
        let appointment_id = ID::default();
        let link = AppointmentLink::new(appointment_id, LinkPurpose::Confirm, HOUR, NOW);
        ctx.repos.appointment_links.insert(&link).await.unwrap();

        assert_eq!(
            resolve(&ctx, &link.token, LinkAction::Confirm).await,
            Err(UseCaseError::AppointmentNotFound(appointment_id))
        );
    }

    #[actix_web::main]
    #[test]
    async fn rejects_already_processed_appointment() {
        let TestContext {
            ctx,
            appointment,
            confirm,
            ..
        } = setup().await;
        let mut other = Appointment::new(appointment.barbershop_id, None, NOW);
        other.status = AppointmentStatus::Canceled;
        ctx.repos.appointments.insert(&other).await.unwrap();
        let link = AppointmentLink::new(other.id, LinkPurpose::Confirm, HOUR, NOW);
        ctx.repos.appointment_links.insert(&link).await.unwrap();

        assert_eq!(
            resolve(&ctx, &link.token, LinkAction::Confirm).await,
            Err(UseCaseError::AlreadyProcessed(AppointmentStatus::Canceled))
        );
        // The untouched pending appointment still works
        assert!(resolve(&ctx, &confirm.token, LinkAction::Confirm)
            .await
            .is_ok());
    }

    /// Fails the next `resolve_with_link` calls as if storage was unreachable
    struct UnreliableAppointmentRepo {
        inner: Arc<dyn IAppointmentRepo>,
        failures_left: Mutex<usize>,
    }

    #[async_trait::async_trait]
    impl IAppointmentRepo for UnreliableAppointmentRepo {
        async fn insert(&self, appointment: &Appointment) -> anyhow::Result<()> {
            self.inner.insert(appointment).await
        }

        async fn find(&self, appointment_id: &ID) -> anyhow::Result<Option<Appointment>> {
            self.inner.find(appointment_id).await
        }

        async fn resolve_with_link(
            &self,
            link_id: &ID,
            appointment_id: &ID,
            from: AppointmentStatus,
            to: AppointmentStatus,
            now: i64,
        ) -> anyhow::Result<LinkResolution> {
            {
                let mut failures_left = self.failures_left.lock().unwrap();
                if *failures_left > 0 {
                    *failures_left -= 1;
                    return Err(anyhow::Error::msg("connection reset"));
                }
            }
            self.inner
                .resolve_with_link(link_id, appointment_id, from, to, now)
                .await
        }

        async fn find_by_status_starting_in(
            &self,
            status: AppointmentStatus,
            span: &TimeSpan,
        ) -> anyhow::Result<Vec<Appointment>> {
            self.inner.find_by_status_starting_in(status, span).await
        }
    }

    #[actix_web::main]
    #[test]
    async fn link_stays_usable_after_storage_failure() {
        let TestContext {
            mut ctx,
            appointment,
            confirm,
            ..
        } = setup().await;
        ctx.repos.appointments = Arc::new(UnreliableAppointmentRepo {
            inner: ctx.repos.appointments.clone(),
            failures_left: Mutex::new(1),
        });

        assert_eq!(
            resolve(&ctx, &confirm.token, LinkAction::Confirm).await,
            Err(UseCaseError::StorageError)
        );
        let links = ctx
            .repos
            .appointment_links
            .find_by_appointment(&appointment.id)
            .await
            .unwrap();
        assert!(links.iter().all(|l| l.used_ts.is_none()));

        let res = resolve(&ctx, &confirm.token, LinkAction::Confirm).await;
        assert_eq!(res.unwrap().status, AppointmentStatus::Confirmed);
        let stored = ctx
            .repos
            .appointments
            .find(&appointment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn already_processed_message_names_status() {
        let e = BarberError::from(UseCaseError::AlreadyProcessed(AppointmentStatus::Confirmed));
        assert_eq!(
            e.to_string(),
            "The appointment has already been processed and is confirmed"
        );
    }
}
