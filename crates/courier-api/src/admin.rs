use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};

use courier_types::api::{Claims, StatusMessage, UserProfile};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::profile::{apply_profile_update, read_profile_form};
use crate::run_blocking;
use crate::users::profile_of;

/// Admin routes respond 401, not 403, to non-admin callers — the original
/// contract treats "not an admin" the same as "not logged in".
fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.is_admin {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

/// GET /admin/users — every user record, admin flag included.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let rows = run_blocking(move || Ok(db.db.list_users()?)).await?;
    let users: Vec<UserProfile> = rows.into_iter().map(profile_of).collect();

    Ok(Json(users))
}

/// DELETE /admin/users/{user_id} — remove a user and every message they sent
/// or received, in one transaction.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    if !run_blocking(move || Ok(db.db.delete_user_and_messages(user_id)?)).await? {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(StatusMessage::new(
        "User and associated messages deleted successfully",
    )))
}

/// PUT /admin/users/{user_id} — edit any user's profile fields.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let form = read_profile_form(multipart).await?;
    if !apply_profile_update(&state, user_id, form).await? {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(StatusMessage::new("User profile updated successfully")))
}
