mod config;
mod repos;
mod services;
mod system;

pub use config::{BillingConfig, Config, NotificationsConfig};
pub use repos::{
    IAppointmentLinkRepo, IAppointmentRepo, IReminderQueueRepo, ISubscriptionRepo,
    LinkResolution, Repos,
};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};
use tracing::{info, warn};

#[derive(Clone)]
pub struct BarberContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    /// `None` when no billing credentials are configured
    pub billing: Option<Arc<dyn IBillingProvider>>,
    pub notifications: Arc<dyn INotificationSender>,
}

struct ContextParams {
    pub postgres_connection_string: Option<String>,
}

impl BarberContext {
    async fn create(params: ContextParams) -> anyhow::Result<Self> {
        let repos = match params.postgres_connection_string {
            Some(connection_string) => Repos::create_postgres(&connection_string).await?,
            None => {
                warn!("DATABASE_URL is not set, falling back to inmemory repositories.");
                Repos::create_inmemory()
            }
        };
        let config = Config::new();
        Ok(Self::from_parts(repos, config, Arc::new(RealSys {})))
    }

    /// Wires the collaborators described by the `Config`
    pub fn from_parts(repos: Repos, config: Config, sys: Arc<dyn ISys>) -> Self {
        let billing = config.billing.as_ref().map(|billing| {
            Arc::new(PayPalBillingProvider::new(
                billing.api_base_url.clone(),
                billing.client_id.clone(),
                billing.client_secret.clone(),
            )) as Arc<dyn IBillingProvider>
        });
        let notifications = Arc::new(HttpNotificationSender::new(
            config.notifications.email_url.clone(),
            config.notifications.push_url.clone(),
            config.notifications.api_key.clone(),
        ));
        Self {
            repos,
            config,
            sys,
            billing,
            notifications,
        }
    }

    /// Context backed by inmemory repositories, used by tests
    pub fn create_inmemory() -> Self {
        Self::from_parts(
            Repos::create_inmemory(),
            Config::new(),
            Arc::new(RealSys {}),
        )
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<BarberContext> {
    BarberContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> Option<String> {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING).ok()
}

/// Applies the migrations when a database is configured
pub async fn run_migration() -> Result<(), MigrateError> {
    let connection_string = match get_psql_connection_string() {
        Some(connection_string) => connection_string,
        None => return Ok(()),
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await?;

    info!("Running database migrations");
    sqlx::migrate!().run(&pool).await
}
