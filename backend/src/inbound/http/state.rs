//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and only see domain
//! ports, so they stay testable without a database.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{DatabaseHealth, ItemsCommand, ItemsQuery, UsersCommand, UsersQuery};

/// Service metadata reported by `/`, `/info` and `/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub project_name: String,
    pub version: String,
    pub environment: String,
    pub debug: bool,
}

impl ServiceInfo {
    /// Metadata for the running crate version.
    pub fn new(project_name: impl Into<String>, environment: impl Into<String>, debug: bool) -> Self {
        Self {
            project_name: project_name.into(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: environment.into(),
            debug,
        }
    }

    /// Name used for the service in health reports (`<project>-api`).
    pub fn service_name(&self) -> String {
        format!("{}-api", self.project_name)
    }

    /// Documentation path, advertised only when docs are served.
    pub fn docs_url(&self) -> Option<&'static str> {
        self.debug.then_some("/docs")
    }
}

/// Port implementations handed to the HTTP layer.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UsersQuery>,
    pub users_command: Arc<dyn UsersCommand>,
    pub items: Arc<dyn ItemsQuery>,
    pub items_command: Arc<dyn ItemsCommand>,
    pub database: Arc<dyn DatabaseHealth>,
    /// Source of the timestamps handlers report.
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UsersQuery>,
    pub users_command: Arc<dyn UsersCommand>,
    pub items: Arc<dyn ItemsQuery>,
    pub items_command: Arc<dyn ItemsCommand>,
    pub database: Arc<dyn DatabaseHealth>,
    pub clock: Arc<dyn Clock>,
    pub info: ServiceInfo,
}

impl HttpState {
    /// Construct state from a ports bundle and service metadata.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use crud_backend::domain::{ItemService, UserService};
    /// use crud_backend::inbound::http::state::{HttpState, HttpStatePorts, ServiceInfo};
    /// use crud_backend::outbound::password::Argon2PasswordHasher;
    /// use crud_backend::outbound::persistence::{
    ///     DbPool, DieselDatabaseHealth, DieselItemRepository, DieselUserRepository,
    /// };
    /// use mockable::DefaultClock;
    ///
    /// # async fn build(pool: DbPool) {
    /// let clock: Arc<dyn mockable::Clock> = Arc::new(DefaultClock);
    /// let users = Arc::new(UserService::new(
    ///     Arc::new(DieselUserRepository::new(pool.clone())),
    ///     Arc::new(Argon2PasswordHasher::new()),
    ///     clock.clone(),
    /// ));
    /// let items = Arc::new(ItemService::new(
    ///     Arc::new(DieselItemRepository::new(pool.clone())),
    ///     clock,
    /// ));
    /// let state = HttpState::new(
    ///     HttpStatePorts {
    ///         users: users.clone(),
    ///         users_command: users,
    ///         items: items.clone(),
    ///         items_command: items,
    ///         database: Arc::new(DieselDatabaseHealth::new(pool)),
    ///         clock: Arc::new(DefaultClock),
    ///     },
    ///     ServiceInfo::new("CRUD Backend", "development", true),
    /// );
    /// # let _ = state;
    /// # }
    /// ```
    pub fn new(ports: HttpStatePorts, info: ServiceInfo) -> Self {
        let HttpStatePorts {
            users,
            users_command,
            items,
            items_command,
            database,
            clock,
        } = ports;
        Self {
            users,
            users_command,
            items,
            items_command,
            database,
            clock,
            info,
        }
    }
}
