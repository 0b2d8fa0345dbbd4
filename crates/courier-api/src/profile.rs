use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, State},
    response::IntoResponse,
};
use tracing::debug;

use courier_types::api::{Claims, StatusMessage};

use crate::attachments::{self, AttachmentOutcome};
use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;
use crate::users::profile_of;

/// Fields of the multipart profile-edit form, shared with the admin edit
/// route. Absent text fields clear the stored value, except `username`,
/// which falls back to the current one.
#[derive(Default)]
pub(crate) struct ProfileForm {
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub status: Option<String>,
    pub picture: Option<(String, Bytes)>,
}

pub(crate) async fn read_profile_form(mut multipart: Multipart) -> Result<ProfileForm, ApiError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => {
                form.username = Some(field.text().await.map_err(|_| ApiError::BadRequest)?);
            }
            "phone_number" => {
                form.phone_number = Some(field.text().await.map_err(|_| ApiError::BadRequest)?);
            }
            "status" => {
                form.status = Some(field.text().await.map_err(|_| ApiError::BadRequest)?);
            }
            "profile_pic" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|_| ApiError::BadRequest)?;
                if let Some(name) = filename.filter(|n| !n.is_empty()) {
                    form.picture = Some((name, data));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Apply a profile edit to `user_id`. Returns false when the user does not
/// exist. A rejected picture upload is skipped the same way a rejected
/// message attachment is.
pub(crate) async fn apply_profile_update(
    state: &AppState,
    user_id: i64,
    form: ProfileForm,
) -> Result<bool, ApiError> {
    let db = state.clone();
    let Some(current) = run_blocking(move || Ok(db.db.get_user_by_id(user_id)?)).await? else {
        return Ok(false);
    };

    let mut picture: Option<String> = None;
    if let Some((name, data)) = form.picture {
        match attachments::validate_upload(&name) {
            AttachmentOutcome::Accepted(safe) => {
                attachments::save(&state.profile_pic_dir, &safe, &data).await?;
                picture = Some(safe);
            }
            AttachmentOutcome::Rejected => {
                debug!("profile picture '{}' failed the extension allow-list, skipping it", name);
            }
        }
    }

    let username = form.username.unwrap_or(current.username);
    let db = state.clone();
    run_blocking(move || {
        Ok(db.db.update_user_profile(
            user_id,
            &username,
            form.phone_number.as_deref(),
            form.status.as_deref(),
            picture.as_deref(),
        )?)
    })
    .await
}

/// GET /profile — the caller's own record.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller_id = claims.sub;
    let user = run_blocking(move || Ok(db.db.get_user_by_id(caller_id)?))
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(profile_of(user)))
}

/// PUT /profile — edit the caller's own record.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_profile_form(multipart).await?;

    if !apply_profile_update(&state, claims.sub, form).await? {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(StatusMessage::new("Profile updated successfully")))
}
