use crate::error::BarberError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use barbershop_booking_api_structs::dispatch_push_reminders::*;
use barbershop_booking_domain::{AppointmentStatus, ReminderHorizon};
use barbershop_booking_infra::BarberContext;
use tracing::warn;

pub async fn send_push_reminders_controller(
    ctx: web::Data<BarberContext>,
) -> Result<HttpResponse, BarberError> {
    let usecase = SendPushRemindersUseCase;

    execute(usecase, &ctx)
        .await
        .map(|res| HttpResponse::Ok().json(res))
        .map_err(BarberError::from)
}

/// Sends push notifications for confirmed appointments that start within one
/// of the `ReminderHorizon`s.
///
/// Nothing is stored about which notifications went out. Calling it more
/// often than the width of the horizon windows sends duplicates, calling it
/// less often skips appointments.
#[derive(Debug)]
pub struct SendPushRemindersUseCase;

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

async fn send_for_horizon(
    horizon: ReminderHorizon,
    now: i64,
    ctx: &BarberContext,
) -> Result<HorizonResult, UseCaseError> {
    let window = horizon.window(now);
    let appointments = ctx
        .repos
        .appointments
        .find_by_status_starting_in(AppointmentStatus::Confirmed, &window)
        .await
        .map_err(|_| UseCaseError::StorageError)?;

    let mut result = HorizonResult::default();
    for appointment in appointments {
        match ctx
            .notifications
            .send_push(horizon.kind(), &appointment.id)
            .await
        {
            Ok(()) => result.processed += 1,
            Err(e) => {
                warn!(
                    "Sending {} push for appointment {} failed. Error: {}",
                    horizon.kind(),
                    appointment.id,
                    e
                );
                result
                    .errors
                    .push(format!("Appointment {}: {}", appointment.id, e));
            }
        }
    }
    Ok(result)
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendPushRemindersUseCase {
    type Response = APIResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "SendPushReminders";

    async fn execute(&mut self, ctx: &BarberContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();

        let mut results = HorizonResults::default();
        for horizon in ReminderHorizon::ALL {
            let result = send_for_horizon(horizon, now, ctx).await?;
            match horizon {
                ReminderHorizon::ThirtyMinutes => results.reminder_30min = result,
                ReminderHorizon::TwoHours => results.reminder_2h = result,
                ReminderHorizon::TwentyFourHours => results.reminder_24h = result,
            }
        }

        Ok(APIResponse {
            success: true,
            results,
            timestamp: now,
        })
    }
}
