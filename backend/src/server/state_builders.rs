//! Builders wiring Diesel adapters and domain services into HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use crud_backend::domain::ports::{
    DatabaseHealth, ItemRepository, PasswordHasher, UserRepository,
};
use crud_backend::domain::{ItemService, UserService};
use crud_backend::inbound::http::state::{HttpState, HttpStatePorts, ServiceInfo};
use crud_backend::outbound::password::Argon2PasswordHasher;
use crud_backend::outbound::persistence::{
    DbPool, DieselDatabaseHealth, DieselItemRepository, DieselUserRepository,
};

/// Assemble the HTTP ports from repository adapters.
pub(super) fn build_ports<U, I, H>(
    users: Arc<U>,
    items: Arc<I>,
    hasher: Arc<H>,
    database: Arc<dyn DatabaseHealth>,
    clock: Arc<dyn Clock>,
) -> HttpStatePorts
where
    U: UserRepository + 'static,
    I: ItemRepository + 'static,
    H: PasswordHasher + 'static,
{
    let user_service = Arc::new(UserService::new(users, hasher, clock.clone()));
    let item_service = Arc::new(ItemService::new(items, clock.clone()));
    HttpStatePorts {
        users: user_service.clone(),
        users_command: user_service,
        items: item_service.clone(),
        items_command: item_service,
        database,
        clock,
    }
}

/// Build HTTP state over the PostgreSQL pool.
pub(super) fn build_http_state(pool: &DbPool, info: ServiceInfo) -> web::Data<HttpState> {
    let ports = build_ports(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselItemRepository::new(pool.clone())),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(DieselDatabaseHealth::new(pool.clone())),
        Arc::new(DefaultClock),
    );
    web::Data::new(HttpState::new(ports, info))
}
