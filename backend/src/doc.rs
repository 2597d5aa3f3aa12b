//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP endpoint from the inbound layer together
//! with the domain and request schemas they reference. Debug deployments
//! serve it through Swagger UI at `/docs` and ReDoc at `/redoc`; the
//! `openapi-dump` binary prints it for external tooling.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, Item, User};
use crate::inbound::http::health::{CheckStatus, HealthChecks, HealthReport};
use crate::inbound::http::items::{CreateItemRequest, UpdateItemRequest};
use crate::inbound::http::root::{ServiceInfoResponse, Welcome};
use crate::inbound::http::users::{CreateUserRequest, UpdateUserRequest};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CRUD backend API",
        description = "Users and items over PostgreSQL, with health and service probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::items::list_items,
        crate::inbound::http::items::create_item,
        crate::inbound::http::items::get_item,
        crate::inbound::http::items::update_item,
        crate::inbound::http::items::delete_item,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::root::root,
        crate::inbound::http::root::service_info,
    ),
    components(schemas(
        User,
        Item,
        Error,
        ErrorCode,
        CreateUserRequest,
        UpdateUserRequest,
        CreateItemRequest,
        UpdateItemRequest,
        HealthReport,
        HealthChecks,
        CheckStatus,
        Welcome,
        ServiceInfoResponse,
    )),
    tags(
        (name = "users", description = "User accounts"),
        (name = "items", description = "Items owned by users"),
        (name = "health", description = "Liveness, readiness and dependency checks"),
        (name = "info", description = "Service metadata")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document's paths and schema fields.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn schema(name: &str) -> RefOr<Schema> {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        components
            .schemas
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("schema {name} registered"))
    }

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/users")]
    #[case("/api/users/{user_id}")]
    #[case("/api/items")]
    #[case("/api/items/{item_id}")]
    #[case("/health")]
    #[case("/health/ready")]
    #[case("/health/live")]
    #[case("/")]
    #[case("/info")]
    fn document_lists_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    #[case("Error", &["code", "message", "traceId", "details"])]
    #[case("User", &["id", "email", "username", "isActive", "extraData", "createdAt"])]
    #[case("Item", &["id", "title", "price", "currency", "ownerId", "tags"])]
    fn schemas_use_wire_field_names(#[case] name: &str, #[case] fields: &[&str]) {
        let schema = schema(name);
        for field in fields {
            assert_object_schema_has_field(&schema, field);
        }
    }

    #[rstest]
    fn user_schema_omits_password_hash() {
        match schema("User") {
            RefOr::T(Schema::Object(obj)) => {
                assert!(!obj.properties.contains_key("hashedPassword"));
                assert!(!obj.properties.contains_key("hashed_password"));
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn document_serialises_to_json() {
        let json = ApiDoc::openapi().to_json().expect("serialise");
        assert!(json.contains("\"CRUD backend API\""));
    }
}
