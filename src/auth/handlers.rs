use axum::{extract::State, routing::post, Router};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        password::verify_password_blocking,
    },
    error::AppError,
    extract::ApiJson,
    response::{ApiResponse, ApiResult},
    state::AppState,
    users::{repo_types::UserField, validation::validate_login},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials")
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = validate_login(&payload.email, &payload.password)?;

    let Some(user) = state.users.find_by_field(UserField::Email, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid_credentials());
    };

    let ok = verify_password_blocking(payload.password, user.password_hash.clone())
        .await
        .map_err(|e| {
            error!(error = %e, "verify_password failed");
            AppError::internal(e)
        })?;
    if !ok {
        warn!(email = %email, user_id = user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    let token = state.keys.issue(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::internal(e)
    })?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token,
            user: user.into(),
        },
    ))
}
