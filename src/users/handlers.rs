use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Router,
};
use tracing::{debug, error, info, instrument, warn};

use super::{
    dto::{CreateUserRequest, DeletedUser, PublicUser, UpdateUserRequest},
    repo_types::{NewUser, UserChanges},
    validation::{validate_create, validate_update},
};
use crate::{
    auth::middleware::{require_auth, AuthUser},
    error::AppError,
    extract::{parse_user_id, ApiJson},
    response::{ApiResponse, ApiResult},
    state::AppState,
};

pub fn user_routes(state: &AppState) -> Router<AppState> {
    let auth = from_fn_with_state(state.clone(), require_auth);
    Router::new()
        .route(
            "/users",
            post(create_user).merge(get(list_users).route_layer(auth.clone())),
        )
        .route(
            "/users/:id",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .route_layer(auth),
        )
}

fn user_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User {id} not found"))
}

async fn hash(state: &AppState, password: String) -> Result<String, AppError> {
    state.passwords.hash_blocking(password).await.map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::internal(e)
    })
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> ApiResult<PublicUser> {
    let input = validate_create(payload)?;
    let password_hash = hash(&state, input.password).await?;

    let user = state
        .users
        .insert(NewUser {
            username: input.username,
            email: input.email,
            password_hash,
        })
        .await?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok(ApiResponse::created("User created successfully", user.into()))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
) -> ApiResult<Vec<PublicUser>> {
    let users = state.users.list().await?;
    let users: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();
    info!(caller, count = users.len(), "users listed");
    Ok(ApiResponse::ok("Users retrieved successfully", users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<PublicUser> {
    let id = parse_user_id(&raw_id)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    debug!(user_id = id, caller, "user fetched");
    Ok(ApiResponse::ok("User retrieved successfully", user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> ApiResult<PublicUser> {
    let id = parse_user_id(&raw_id)?;
    let patch = validate_update(payload)?;

    if state.users.find_by_id(id).await?.is_none() {
        warn!(user_id = id, "update of unknown user");
        return Err(user_not_found(id));
    }

    // Passwords are re-hashed on update just like on create.
    let password_hash = match patch.password {
        Some(plain) => Some(hash(&state, plain).await?),
        None => None,
    };
    let changes = UserChanges {
        username: patch.username,
        email: patch.email,
        password_hash,
    };

    let user = state
        .users
        .update(id, changes)
        .await?
        .ok_or_else(|| user_not_found(id))?;

    info!(user_id = id, caller, "user updated");
    Ok(ApiResponse::ok("User updated successfully", user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> ApiResult<DeletedUser> {
    let id = parse_user_id(&raw_id)?;
    if state.users.find_by_id(id).await?.is_none() {
        return Err(user_not_found(id));
    }
    if !state.users.delete(id).await? {
        return Err(user_not_found(id));
    }

    info!(user_id = id, caller, "user deleted");
    Ok(ApiResponse::ok(
        "User deleted successfully",
        DeletedUser {
            deleted_user_id: id,
        },
    ))
}
