//! CRUD backend library: users and items over PostgreSQL, plus the revision
//! graph migration engine shared by the server and the `migrate` CLI.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI, ReDoc and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
