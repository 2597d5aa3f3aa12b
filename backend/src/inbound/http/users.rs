//! Users API handlers.
//!
//! ```text
//! GET    /api/users?skip=0&limit=100
//! POST   /api/users {"email":"ada@example.com","username":"ada","password":"..."}
//! GET    /api/users/{user_id}
//! PUT    /api/users/{user_id} {"bio":"..."}
//! DELETE /api/users/{user_id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::user::{validate_avatar_url, validate_extra_data, validate_full_name};
use crate::domain::{
    Email, Error, NewUser, PlainPassword, User, UserChanges, UserValidationError, Username,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, page_request, parse_user_id, user_validation_error,
};

const USER_ID: FieldName = FieldName::new("userId");

/// `skip`/`limit` query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Rows to skip (default 0).
    pub skip: Option<u64>,
    /// Page size (default 100, max 1000).
    pub limit: Option<u32>,
}

/// Request body for `POST /api/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub extra_data: Option<Value>,
}

fn default_true() -> bool {
    true
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = UserValidationError;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: Email::new(value.email)?,
            username: Username::new(value.username)?,
            password: PlainPassword::new(value.password)?,
            full_name: validate_full_name(value.full_name)?,
            is_active: value.is_active,
            is_superuser: value.is_superuser,
            is_verified: value.is_verified,
            avatar_url: validate_avatar_url(value.avatar_url)?,
            bio: value.bio,
            extra_data: validate_extra_data(value.extra_data)?,
        })
    }
}

/// Request body for `PUT /api/users/{user_id}`; absent fields are unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    /// New password; stored re-hashed.
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub extra_data: Option<Value>,
}

impl TryFrom<UpdateUserRequest> for UserChanges {
    type Error = UserValidationError;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: value.email.map(Email::new).transpose()?,
            username: value.username.map(Username::new).transpose()?,
            password: value.password.map(PlainPassword::new).transpose()?,
            full_name: validate_full_name(value.full_name)?,
            is_active: value.is_active,
            is_superuser: value.is_superuser,
            is_verified: value.is_verified,
            avatar_url: validate_avatar_url(value.avatar_url)?,
            bio: value.bio,
            extra_data: value
                .extra_data
                .map(|extra| validate_extra_data(Some(extra)))
                .transpose()?,
        })
    }
}

/// List users ordered by creation time.
#[utoipa::path(
    get,
    path = "/api/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 400, description = "Invalid pagination", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Vec<User>>> {
    let PageQuery { skip, limit } = query.into_inner();
    let page = page_request(skip, limit)?;
    let users = state.users.list_users(page).await?;
    Ok(web::Json(users))
}

/// Register a user.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email or username already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let new_user = NewUser::try_from(payload.into_inner()).map_err(user_validation_error)?;
    let user = state.users_command.create_user(new_user).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Fetch a user by id.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{user_id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let id = parse_user_id(&path, USER_ID)?;
    let user = state.users.get_user(&id).await?;
    Ok(web::Json(user))
}

/// Partially update a user.
#[utoipa::path(
    put,
    path = "/api/users/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "No such user", body = Error),
        (status = 409, description = "Email or username already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{user_id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<User>> {
    let id = parse_user_id(&path, USER_ID)?;
    let changes = UserChanges::try_from(payload.into_inner()).map_err(user_validation_error)?;
    let user = state.users_command.update_user(&id, changes).await?;
    Ok(web::Json(user))
}

/// Delete a user together with their items.
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{user_id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path, USER_ID)?;
    state.users_command.delete_user(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
