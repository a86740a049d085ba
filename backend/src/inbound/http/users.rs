//! Account HTTP handlers.
//!
//! ```text
//! POST  /api/user/create {"email":"cook@example.com","password":"secret","name":"Cook"}
//! POST  /api/user/token  {"email":"cook@example.com","password":"secret"}
//! GET   /api/user/me
//! PUT   /api/user/me     {"name":"Head Cook"}
//! PATCH /api/user/me     {"password":"new-secret"}
//! ```

use actix_web::{HttpResponse, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{ProfileChanges, RegisterRequest};
use crate::domain::{
    AuthValidationError, EmailAddress, Error, LoginCredentials, Password, User, UserName,
    UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, missing_field_error};

const EMAIL: FieldName = FieldName::new("email");
const PASSWORD: FieldName = FieldName::new("password");
const NAME: FieldName = FieldName::new("name");

/// Registration body for `POST /api/user/create`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "cook@example.com")]
    pub email: Option<String>,
    #[schema(example = "secret")]
    pub password: Option<String>,
    #[schema(example = "Cook")]
    pub name: Option<String>,
}

/// Credentials for `POST /api/user/token`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct TokenRequest {
    #[schema(example = "cook@example.com")]
    pub email: Option<String>,
    #[schema(example = "secret")]
    pub password: Option<String>,
}

/// Issued API token, sent back as `Authorization: Token <token>`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b")]
    pub token: String,
}

/// Profile changes for `PUT`/`PATCH /api/user/me`.
///
/// The email is read-only once registered and is ignored when sent.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Account profile. The password is never returned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "cook@example.com")]
    pub email: String,
    #[schema(example = "Cook")]
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

fn user_field_error(err: UserValidationError) -> Error {
    let field = match err {
        UserValidationError::EmptyName | UserValidationError::NameTooLong { .. } => "name",
        _ => "email",
    };
    invalid_field_error(field, err)
}

fn auth_field_error(err: AuthValidationError) -> Error {
    match err {
        AuthValidationError::Email(inner) => user_field_error(inner),
        AuthValidationError::EmptyToken => Error::unauthorized(err.to_string()),
        AuthValidationError::EmptyPassword | AuthValidationError::PasswordTooShort { .. } => {
            invalid_field_error("password", err)
        }
    }
}

fn required(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_registration(payload: CreateUserRequest) -> Result<RegisterRequest, Error> {
    let email = required(payload.email, EMAIL)?;
    let password = required(payload.password, PASSWORD)?;
    let name = required(payload.name, NAME)?;
    Ok(RegisterRequest {
        email: EmailAddress::new(email).map_err(user_field_error)?,
        name: UserName::new(name).map_err(user_field_error)?,
        password: Password::new(&password).map_err(auth_field_error)?,
    })
}

pub(crate) fn parse_credentials(payload: TokenRequest) -> Result<LoginCredentials, Error> {
    let email = required(payload.email, EMAIL)?;
    let password = required(payload.password, PASSWORD)?;
    LoginCredentials::try_from_parts(&email, &password).map_err(auth_field_error)
}

/// `PUT` replaces the profile and therefore needs a name; `PATCH` does not.
pub(crate) fn parse_profile_changes(
    payload: ProfileUpdateRequest,
    require_name: bool,
) -> Result<ProfileChanges, Error> {
    if require_name && payload.name.is_none() {
        return Err(missing_field_error(NAME));
    }
    Ok(ProfileChanges {
        name: payload
            .name
            .map(UserName::new)
            .transpose()
            .map_err(user_field_error)?,
        password: payload
            .password
            .as_deref()
            .map(Password::new)
            .transpose()
            .map_err(auth_field_error)?,
    })
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/user/create",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request or email taken", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "createUser",
    security([])
)]
#[post("/create")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let request = parse_registration(payload.into_inner())?;
    let user = state.accounts.register(request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Exchange credentials for the account's API token.
#[utoipa::path(
    post,
    path = "/api/user/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "createToken",
    security([])
)]
#[post("/token")]
pub async fn create_token(
    state: web::Data<HttpState>,
    payload: web::Json<TokenRequest>,
) -> ApiResult<web::Json<TokenResponse>> {
    let credentials = parse_credentials(payload.into_inner())?;
    let token = state.accounts.issue_token(credentials).await?;
    let token: &str = token.as_ref();
    Ok(web::Json(TokenResponse {
        token: token.to_owned(),
    }))
}

/// Return the caller's profile.
#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getProfile"
)]
#[get("/me")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let profile = state.accounts.profile(user.id()).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(UserResponse::from(profile)))
}

async fn update_profile(
    state: &HttpState,
    user: &AuthenticatedUser,
    payload: ProfileUpdateRequest,
    require_name: bool,
) -> ApiResult<web::Json<UserResponse>> {
    let changes = parse_profile_changes(payload, require_name)?;
    let updated = state.accounts.update_profile(user.id(), changes).await?;
    Ok(web::Json(updated.into()))
}

/// Replace the caller's profile.
#[utoipa::path(
    put,
    path = "/api/user/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "replaceProfile"
)]
#[put("/me")]
pub async fn replace_profile(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    update_profile(&state, &user, payload.into_inner(), true).await
}

/// Partially update the caller's profile.
#[utoipa::path(
    patch,
    path = "/api/user/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "patchProfile"
)]
#[patch("/me")]
pub async fn patch_profile(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    update_profile(&state, &user, payload.into_inner(), false).await
}

#[cfg(test)]
mod tests;
