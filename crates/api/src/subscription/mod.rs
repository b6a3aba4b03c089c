mod get_subscription_access;
mod reconcile_subscriptions;

use actix_web::web;
use get_subscription_access::get_subscription_access_controller;
use reconcile_subscriptions::reconcile_subscriptions_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/subscriptions/reconcile")
            .route(web::post().to(reconcile_subscriptions_controller)),
    );
    cfg.service(
        web::resource("/barbershops/{barbershop_id}/subscription/access")
            .route(web::get().to(get_subscription_access_controller)),
    );
}
