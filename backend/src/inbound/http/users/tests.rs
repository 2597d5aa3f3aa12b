//! Tests for users API handlers.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::domain::Error;
use crate::inbound::http::configure_api;
use crate::inbound::http::test_utils::{StubUsers, test_state};
use crate::test_support::fixtures::user;

#[fixture]
fn ada() -> crate::domain::User {
    user("ada")
}

async fn call(
    users: Arc<StubUsers>,
    request: actix_test::TestRequest,
) -> (StatusCode, Value) {
    let state = test_state().with_users(users).build();
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(web::scope("/api").configure(configure_api)),
    )
    .await;
    let response = actix_test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

#[rstest]
#[actix_web::test]
async fn list_users_returns_camel_case_without_password(ada: crate::domain::User) {
    let users = Arc::new(StubUsers::with_users(vec![ada.clone()]));

    let (status, body) = call(users, actix_test::TestRequest::get().uri("/api/users")).await;

    assert_eq!(status, StatusCode::OK);
    let first = &body.as_array().expect("array")[0];
    assert_eq!(first["id"], ada.id.to_string());
    assert_eq!(first["email"], "ada@example.com");
    assert!(first.get("isActive").is_some());
    assert!(first.get("is_active").is_none());
    assert!(first.get("hashedPassword").is_none());
}

#[rstest]
#[case("limit=0")]
#[case("limit=5000")]
#[case("skip=-1")]
#[actix_web::test]
async fn list_users_rejects_bad_pagination(#[case] query: &str) {
    let (status, body) = call(
        Arc::new(StubUsers::default()),
        actix_test::TestRequest::get().uri(&format!("/api/users?{query}")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[rstest]
#[actix_web::test]
async fn list_users_pages_results() {
    let stub = StubUsers::with_users(vec![user("ada"), user("grace"), user("linus")]);
    let (status, body) = call(
        Arc::new(stub),
        actix_test::TestRequest::get().uri("/api/users?skip=1&limit=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let page = body.as_array().expect("array");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["username"], "grace");
}

#[rstest]
#[actix_web::test]
async fn create_user_returns_201_and_defaults_flags() {
    let users = Arc::new(StubUsers::default());

    let (status, body) = call(
        users.clone(),
        actix_test::TestRequest::post().uri("/api/users").set_json(json!({
            "email": "Grace@Example.com",
            "username": "grace",
            "password": "analytical-engine",
            "fullName": "Grace Hopper"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["fullName"], "Grace Hopper");
    assert_eq!(body["isActive"], true);
    assert_eq!(body["isSuperuser"], false);
    assert_eq!(body["extraData"], json!({}));
    assert_eq!(users.snapshot().len(), 1);
}

#[rstest]
#[case(json!({"email": "no-at-sign", "username": "grace", "password": "long-enough"}), "email", "invalid_email")]
#[case(json!({"email": "g@example.com", "username": "gh", "password": "long-enough"}), "username", "too_short")]
#[case(json!({"email": "g@example.com", "username": "grace", "password": "short"}), "password", "too_short")]
#[case(json!({"email": "g@example.com", "username": "grace", "password": "long-enough", "avatarUrl": "ftp://x"}), "avatarUrl", "invalid_url")]
#[case(json!({"email": "g@example.com", "username": "grace", "password": "long-enough", "extraData": [1]}), "extraData", "invalid_type")]
#[actix_web::test]
async fn create_user_reports_validation_details(
    #[case] payload: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let (status, body) = call(
        Arc::new(StubUsers::default()),
        actix_test::TestRequest::post().uri("/api/users").set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[rstest]
#[actix_web::test]
async fn create_user_maps_duplicates_to_conflict(ada: crate::domain::User) {
    let (status, body) = call(
        Arc::new(StubUsers::with_users(vec![ada])),
        actix_test::TestRequest::post().uri("/api/users").set_json(json!({
            "email": "ada@example.com",
            "username": "another",
            "password": "long-enough"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    assert_eq!(body["details"]["code"], "duplicate_user");
}

#[rstest]
#[actix_web::test]
async fn get_user_rejects_malformed_ids() {
    let (status, body) = call(
        Arc::new(StubUsers::default()),
        actix_test::TestRequest::get().uri("/api/users/42"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "userId");
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[rstest]
#[actix_web::test]
async fn get_user_returns_404_for_unknown_ids() {
    let (status, body) = call(
        Arc::new(StubUsers::default()),
        actix_test::TestRequest::get().uri("/api/users/3fa85f64-5717-4562-b3fc-2c963f66afa6"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[actix_web::test]
async fn update_user_changes_only_supplied_fields(ada: crate::domain::User) {
    let users = Arc::new(StubUsers::with_users(vec![ada.clone()]));

    let (status, body) = call(
        users.clone(),
        actix_test::TestRequest::put()
            .uri(&format!("/api/users/{}", ada.id))
            .set_json(json!({ "bio": "First programmer", "password": "new-long-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "First programmer");
    assert_eq!(body["username"], "ada");
    let stored = &users.snapshot()[0];
    assert_eq!(stored.hashed_password.as_str(), "hashed:new-long-password");
}

#[rstest]
#[actix_web::test]
async fn delete_user_returns_204_then_404(ada: crate::domain::User) {
    let users = Arc::new(StubUsers::with_users(vec![ada.clone()]));
    let uri = format!("/api/users/{}", ada.id);

    let (status, body) = call(users.clone(), actix_test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = call(users, actix_test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn unavailable_database_yields_503() {
    let users = Arc::new(StubUsers::failing(Error::service_unavailable(
        "user repository unavailable",
    )));

    let (status, body) = call(users, actix_test::TestRequest::get().uri("/api/users")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "service_unavailable");
}
