//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::ServerConfig;

#[cfg(feature = "metrics")]
use metrics::MetricsLayer;
#[cfg(feature = "metrics")]
pub(crate) use metrics::prometheus_metrics;
use state_builders::build_http_state;

use actix_cors::Cors;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, http::header, web};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crud_backend::Trace;
use crud_backend::doc::ApiDoc;
use crud_backend::inbound::http::configure_api;
use crud_backend::inbound::http::health::{HealthState, health, live, ready};
use crud_backend::inbound::http::root::{root, service_info};
use crud_backend::inbound::http::state::HttpState;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    prefix: String,
    cors_origins: Vec<String>,
}

/// CORS policy allowing `origins` with credentials.
fn cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers([crud_backend::domain::TRACE_ID_HEADER])
        .supports_credentials()
        .max_age(3600);
    for origin in origins {
        if origin == "*" {
            warn!("wildcard CORS origin ignored; list explicit origins for credentialed requests");
            continue;
        }
        cors = cors.allowed_origin(origin);
    }
    cors
}

/// Swagger UI, ReDoc and the raw document, registered only in debug mode.
fn docs(cfg: &mut web::ServiceConfig) {
    cfg.service(SwaggerUi::new("/docs/{_:.*}").url("/openapi.json", ApiDoc::openapi()))
        .service(Redoc::with_url("/redoc", ApiDoc::openapi()));
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        prefix,
        cors_origins,
    } = deps;
    let debug = http_state.info.debug;

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(cors(&cors_origins))
        .wrap(Trace)
        .service(web::scope(&prefix).configure(configure_api))
        .service(health)
        .service(ready)
        .service(live)
        .service(service_info)
        .configure(|cfg| {
            if debug {
                docs(cfg);
            }
        })
        .service(root)
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        prefix,
        cors_origins,
        info,
        db_pool,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    let http_state = build_http_state(&db_pool, info);
    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state,
        prefix,
        cors_origins,
    };

    #[cfg(feature = "metrics")]
    let metrics_layer = MetricsLayer::from_option(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(deps.clone());

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
