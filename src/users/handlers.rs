use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::CurrentUser,
        password::{hash_password, verify_password},
    },
    authz::{self, Action, Role},
    error::ApiError,
    state::AppState,
    users::{
        dto::{ChangePasswordRequest, MessageResponse, PublicUser, UpdateUserRequest},
        repo::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).put(update_user))
        .route("/users/:id/password", put(change_password))
}

/// Admin-or-self: ownership checks live beside the role table, not in it.
fn require_self_or_admin(current: &CurrentUser, target: Uuid) -> Result<(), ApiError> {
    if current.role == Role::Admin || current.id == target {
        Ok(())
    } else {
        Err(ApiError::Forbidden("not authorized for this user"))
    }
}

#[instrument(skip(state, current))]
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    authz::require(current.role, Action::ListUsers)?;
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, current))]
pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    require_self_or_admin(&current, id)?;
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, current, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;
    require_self_or_admin(&current, id)?;

    // Role and activation flips are admin territory.
    if (payload.role.is_some() || payload.is_active.is_some()) && current.role != Role::Admin {
        warn!(user_id = %current.id, "non-admin tried to change role or active flag");
        return Err(ApiError::Forbidden(
            "only administrators can change roles or account status",
        ));
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if payload.email != user.email && User::email_taken(&state.db, &payload.email, id).await? {
        return Err(ApiError::Duplicate("email"));
    }

    let updated = User::update_profile(
        &state.db,
        id,
        payload.name.trim(),
        &payload.email,
        payload.role,
        payload.is_active,
    )
    .await?;

    info!(user_id = %id, by = %current.id, "user updated");
    Ok(Json(PublicUser::from(updated)))
}

#[instrument(skip(state, current, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_self_or_admin(&current, id)?;

    if payload.new_password.len() < 6 {
        return Err(ApiError::invalid(
            "new_password",
            "password must be at least 6 characters",
        ));
    }

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    // Changing your own password requires the current one; an admin resetting
    // someone else's does not.
    if current.id == id {
        let current_password = payload.current_password.as_deref().ok_or_else(|| {
            ApiError::invalid("current_password", "current password is required")
        })?;
        if !verify_password(current_password, &user.password_hash)? {
            warn!(user_id = %id, "password change with wrong current password");
            return Err(ApiError::invalid(
                "current_password",
                "current password is incorrect",
            ));
        }
    }

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, id, &hash).await?;

    info!(user_id = %id, by = %current.id, "password changed");
    Ok(Json(MessageResponse {
        message: "password updated",
    }))
}
