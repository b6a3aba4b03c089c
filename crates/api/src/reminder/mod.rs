mod send_push_reminders;
mod send_queued_reminders;

use actix_web::web;
use send_push_reminders::send_push_reminders_controller;
use send_queued_reminders::send_queued_reminders_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reminders/dispatch")
            .route(web::post().to(send_queued_reminders_controller)),
    );
    cfg.service(
        web::resource("/reminders/push/dispatch")
            .route(web::post().to(send_push_reminders_controller)),
    );
}
