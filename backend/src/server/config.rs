//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use crud_backend::inbound::http::state::ServiceInfo;
use crud_backend::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) prefix: String,
    pub(crate) cors_origins: Vec<String>,
    pub(crate) info: ServiceInfo,
    pub(crate) db_pool: DbPool,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration around a ready connection pool.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, db_pool: DbPool, info: ServiceInfo) -> Self {
        Self {
            bind_addr,
            prefix: "/api".to_owned(),
            cors_origins: Vec::new(),
            info,
            db_pool,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Mount the users and items resources under `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Origins allowed to make credentialed cross-origin requests.
    #[must_use]
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
