//! Backend entry-point: loads configuration, reconciles migrations when
//! asked to, and serves the users and items API.

mod server;

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crud_backend::inbound::http::health::HealthState;
use crud_backend::inbound::http::state::ServiceInfo;
use crud_backend::outbound::migrations::{FileRevisionSource, PgMigrationRunner};
use crud_backend::outbound::persistence::{DbPool, DieselMigrationStore};
use crud_backend::settings::{ApiSettings, Settings};

#[cfg(feature = "metrics")]
use server::prometheus_metrics;
use server::{ServerConfig, create_server};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = fmt().with_env_filter(filter).json().try_init() {
        warn!(error = %e, "tracing init failed");
    }
}

fn resolve_bind_addr(api: &ApiSettings) -> std::io::Result<SocketAddr> {
    (api.host(), api.port())
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| {
            std::io::Error::other(format!(
                "no address resolved for {}:{}",
                api.host(),
                api.port()
            ))
        })
}

async fn run_migrations(pool: &DbPool, settings: &Settings) -> std::io::Result<()> {
    let runner = PgMigrationRunner::new(
        Arc::new(DieselMigrationStore::new(pool.clone())),
        Arc::new(FileRevisionSource::new(&settings.migrations_dir)),
        Arc::new(DefaultClock),
    );
    let outcome = runner
        .auto()
        .await
        .map_err(|e| std::io::Error::other(format!("startup migrations failed: {e}")))?;
    info!(
        branch = outcome.branch.as_str(),
        applied = outcome.applied.len(),
        "startup migrations complete"
    );
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, "ignoring unreadable .env file");
        }
    }

    let settings = Settings::from_env(&DefaultEnv::new())
        .map_err(|e| std::io::Error::other(format!("invalid configuration: {e}")))?;
    let api = ApiSettings::load()
        .map_err(|e| std::io::Error::other(format!("invalid API settings: {e}")))?;
    let bind_addr = resolve_bind_addr(&api)?;

    let pool = DbPool::new(settings.database.pool_config())
        .await
        .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
    if settings.run_migrations {
        run_migrations(&pool, &settings).await?;
    }

    let info = ServiceInfo::new(
        settings.project_name.clone(),
        settings.environment.clone(),
        settings.debug,
    );
    let config = ServerConfig::new(bind_addr, pool, info)
        .with_prefix(api.prefix())
        .with_cors_origins(settings.cors_origins.clone());
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(prometheus_metrics(&settings.project_name));

    info!(
        %bind_addr,
        environment = %settings.environment,
        debug = settings.debug,
        "starting server"
    );
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}
