use crate::error::BarberError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use barbershop_booking_api_structs::dispatch_reminders::APIResponse;
use barbershop_booking_domain::{ReminderQueueEntry, RetryPolicy};
use barbershop_booking_infra::BarberContext;
use tracing::{debug, error, warn};

pub async fn send_queued_reminders_controller(
    ctx: web::Data<BarberContext>,
) -> Result<HttpResponse, BarberError> {
    let usecase = SendQueuedRemindersUseCase {
        batch_size: ctx.config.reminder_batch_size,
        retry_policy: ctx.config.reminder_retry_policy(),
    };

    execute(usecase, &ctx)
        .await
        .map(|summary| HttpResponse::Ok().json(summary))
        .map_err(BarberError::from)
}

/// Sends the email reminders in the queue that are due.
///
/// Every entry is claimed in storage before its email goes out, so runs that
/// overlap never send the same entry twice. A failed delivery is recorded on
/// the entry and the run moves on to the next one.
#[derive(Debug)]
pub struct SendQueuedRemindersUseCase {
    pub batch_size: i64,
    pub retry_policy: RetryPolicy,
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

/// What got persisted for a single entry
enum Outcome {
    Sent,
    Failed,
    /// Handled by another run, or the result could not be stored
    Skipped,
}

impl SendQueuedRemindersUseCase {
    async fn process(
        &self,
        candidate: ReminderQueueEntry,
        now: i64,
        ctx: &BarberContext,
    ) -> Outcome {
        match ctx
            .repos
            .reminder_queue
            .claim_attempt(&candidate, now)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!("Reminder {} was claimed by another run, skipping it", candidate.id);
                return Outcome::Skipped;
            }
            Err(e) => {
                error!("Unable to claim reminder {}. Error: {:?}", candidate.id, e);
                return Outcome::Skipped;
            }
        }

        let mut entry = candidate;
        entry.begin_attempt(now);
        let outcome = match ctx
            .notifications
            .send_email(&entry.reminder_type, &entry.appointment_id)
            .await
        {
            Ok(()) => {
                entry.record_success(now);
                Outcome::Sent
            }
            Err(e) => {
                warn!(
                    "Sending reminder {} for appointment {} failed. Error: {}",
                    entry.id, entry.appointment_id, e
                );
                entry.record_failure(e.to_string());
                Outcome::Failed
            }
        };

        match ctx
            .repos
            .reminder_queue
            .record_attempt(&entry, entry.attempts)
            .await
        {
            Ok(true) => outcome,
            Ok(false) => {
                warn!(
                    "Reminder {} was updated by someone else, dropping the result of this attempt",
                    entry.id
                );
                Outcome::Skipped
            }
            Err(e) => {
                error!(
                    "Unable to store the result for reminder {}. Error: {:?}",
                    entry.id, e
                );
                Outcome::Skipped
            }
        }
    }
}

#[async_trait::async_trait(?Send)]
impl UseCase for SendQueuedRemindersUseCase {
    type Response = APIResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "SendQueuedReminders";

    async fn execute(&mut self, ctx: &BarberContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let due = ctx
            .repos
            .reminder_queue
            .find_due(now, &self.retry_policy, self.batch_size)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let mut summary = APIResponse::default();
        for entry in due {
            match self.process(entry, now, ctx).await {
                Outcome::Sent => {
                    summary.processed += 1;
                    summary.sent += 1;
                }
                Outcome::Failed => {
                    summary.processed += 1;
                    summary.failed += 1;
                }
                Outcome::Skipped => {}
            }
        }

        Ok(summary)
    }
}
