mod resolve_appointment_token;

use actix_web::web;
use resolve_appointment_token::resolve_appointment_token_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/appointments/resolve-token")
            .route(web::post().to(resolve_appointment_token_controller)),
    );
}
