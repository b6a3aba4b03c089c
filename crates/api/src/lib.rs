mod appointment;
mod error;
mod reminder;
mod shared;
mod status;
mod subscription;

use actix_cors::Cors;
use actix_web::{dev::Server, web, App, HttpServer};
use barbershop_booking_infra::BarberContext;
pub use error::BarberError;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    appointment::configure_routes(cfg);
    reminder::configure_routes(cfg);
    status::configure_routes(cfg);
    subscription::configure_routes(cfg);
}

/// Malformed or incomplete json bodies never reach a use case
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        BarberError::BadClientData(err.to_string()).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        BarberError::BadClientData(err.to_string()).into()
    })
}

pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    pub async fn new(context: BarberContext) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context).await?;

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn configure_server(context: BarberContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .send_wildcard()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .app_data(json_config())
                .app_data(path_config())
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
