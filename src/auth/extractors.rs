use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, authz::Role, error::ApiError, state::AppState, users::repo::User};

/// Authenticated caller, resolved on every request: the token must verify and
/// the referenced account must still exist and be active.
#[derive(Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Role,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    if let Some(token) = parts.headers.get("x-auth-token").and_then(|v| v.to_str().ok()) {
        return Some(token);
    }
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or(ApiError::Unauthenticated("no token, access denied"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthenticated("invalid or expired token")
        })?;

        // The token alone is not enough: the account must still be active.
        let user = User::find_by_id(&state.db, claims.sub).await?;
        match user {
            Some(user) if user.is_active => Ok(CurrentUser {
                id: user.id,
                role: user.role,
            }),
            _ => {
                warn!(user_id = %claims.sub, "token references a missing or disabled account");
                Err(ApiError::Unauthenticated("invalid session"))
            }
        }
    }
}
