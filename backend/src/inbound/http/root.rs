//! Service metadata endpoints: `GET /` and `GET /info`.

use actix_web::{get, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::state::HttpState;

/// Body of `GET /`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    #[schema(example = "Welcome to CRUD Backend API")]
    pub message: String,
    pub version: String,
    /// Present when interactive documentation is served.
    pub docs_url: Option<String>,
    pub environment: String,
}

/// Body of `GET /info`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfoResponse {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub debug: bool,
    /// Configured pool size; reported in debug mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_pool_size: Option<u32>,
}

/// Welcome message with pointers to the documentation.
#[utoipa::path(
    get,
    path = "/",
    tags = ["info"],
    responses((status = 200, description = "Welcome message", body = Welcome))
)]
#[get("/")]
pub async fn root(state: web::Data<HttpState>) -> web::Json<Welcome> {
    let info = &state.info;
    web::Json(Welcome {
        message: format!("Welcome to {} API", info.project_name),
        version: info.version.clone(),
        docs_url: info.docs_url().map(str::to_owned),
        environment: info.environment.clone(),
    })
}

/// Build and runtime information.
#[utoipa::path(
    get,
    path = "/info",
    tags = ["info"],
    responses((status = 200, description = "Service information", body = ServiceInfoResponse))
)]
#[get("/info")]
pub async fn service_info(state: web::Data<HttpState>) -> web::Json<ServiceInfoResponse> {
    let info = &state.info;
    web::Json(ServiceInfoResponse {
        name: format!("{} API", info.project_name),
        version: info.version.clone(),
        environment: info.environment.clone(),
        debug: info.debug,
        database_pool_size: info.debug.then(|| state.database.pool_size()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{StubDatabase, test_state};
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::Value;

    async fn get_json(debug: bool, uri: &str) -> Value {
        let state = test_state()
            .with_debug(debug)
            .with_database(StubDatabase::new(true, 7))
            .build();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(root)
                .service(service_info),
        )
        .await;
        let request = actix_test::TestRequest::get().uri(uri).to_request();
        actix_test::call_and_read_body_json(&app, request).await
    }

    #[rstest]
    #[case(true, Value::from("/docs"))]
    #[case(false, Value::Null)]
    #[actix_web::test]
    async fn welcome_advertises_docs_in_debug(#[case] debug: bool, #[case] docs: Value) {
        let body = get_json(debug, "/").await;
        assert_eq!(body["message"], "Welcome to Test Project API");
        assert_eq!(body["docsUrl"], docs);
        assert_eq!(body["environment"], "test");
    }

    #[rstest]
    #[actix_web::test]
    async fn info_reports_pool_size_only_in_debug() {
        let debug = get_json(true, "/info").await;
        assert_eq!(debug["name"], "Test Project API");
        assert_eq!(debug["databasePoolSize"], 7);

        let release = get_json(false, "/info").await;
        assert_eq!(release["debug"], false);
        assert!(release.get("databasePoolSize").is_none());
    }
}
