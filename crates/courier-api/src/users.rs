use axum::{Extension, Json, extract::{Path, State}, response::IntoResponse};

use courier_db::models::UserRow;
use courier_types::api::{Claims, UserProfile, UserSummary};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

pub(crate) fn profile_of(row: UserRow) -> UserProfile {
    UserProfile {
        id: row.id,
        username: row.username,
        phone_number: row.phone_number,
        status: row.status,
        profile_pic: row.profile_pic,
        is_admin: row.is_admin,
    }
}

/// GET /users — everyone the caller can message, i.e. all users but
/// themselves.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller_id = claims.sub;
    let rows = run_blocking(move || Ok(db.db.list_users_except(caller_id)?)).await?;

    let users: Vec<UserSummary> = rows
        .into_iter()
        .map(|u| UserSummary {
            id: u.id,
            username: u.username,
            profile_pic: u.profile_pic,
        })
        .collect();

    Ok(Json(users))
}

/// GET /users/{user_id} — another user's public profile.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user = run_blocking(move || Ok(db.db.get_user_by_id(user_id)?))
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(profile_of(user)))
}
