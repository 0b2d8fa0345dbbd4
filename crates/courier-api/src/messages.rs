use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use courier_types::api::{Claims, ConversationMessage, SendMessageResponse, StatusMessage};

use crate::attachments::{self, AttachmentOutcome};
use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// Fields of the multipart send form. `receiver_id` stays unparsed-optional:
/// a missing or non-numeric value behaves like an unknown receiver.
#[derive(Default)]
struct SendForm {
    receiver_id: Option<i64>,
    content: String,
    upload: Option<(String, Bytes)>,
}

async fn read_send_form(mut multipart: Multipart) -> Result<SendForm, ApiError> {
    let mut form = SendForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest)?
    {
        // field.text()/bytes() consume the field, so copy the names out first
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "receiver_id" => {
                let text = field.text().await.map_err(|_| ApiError::BadRequest)?;
                form.receiver_id = text.trim().parse().ok();
            }
            "content" => {
                form.content = field.text().await.map_err(|_| ApiError::BadRequest)?;
            }
            "attachment" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|_| ApiError::BadRequest)?;
                // browsers send an empty filename for an unselected file input
                if let Some(name) = filename.filter(|n| !n.is_empty()) {
                    form.upload = Some((name, data));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /messages — create a message from the caller to `receiver_id`, with
/// an optional file attachment. A disallowed attachment is skipped, never an
/// error: the message is still created without it.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_send_form(multipart).await?;

    let receiver_id = form.receiver_id.ok_or(ApiError::ReceiverNotFound)?;
    let db = state.clone();
    if run_blocking(move || Ok(db.db.get_user_by_id(receiver_id)?))
        .await?
        .is_none()
    {
        return Err(ApiError::ReceiverNotFound);
    }

    let mut attachment: Option<String> = None;
    if let Some((name, data)) = form.upload {
        match attachments::validate_upload(&name) {
            AttachmentOutcome::Accepted(safe) => {
                attachments::save(&state.upload_dir, &safe, &data).await?;
                attachment = Some(safe);
            }
            AttachmentOutcome::Rejected => {
                debug!("upload '{}' failed the extension allow-list, sending without it", name);
            }
        }
    }

    let db = state.clone();
    let sender_id = claims.sub;
    let message_id = run_blocking(move || {
        Ok(db
            .db
            .insert_message(sender_id, receiver_id, &form.content, attachment.as_deref())?)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: "Message sent successfully".into(),
            message_id,
        }),
    ))
}

/// GET /messages/{peer_id} — the full thread between the caller and a peer,
/// oldest first. The caller's own messages carry the literal sender label
/// "You"; an unknown peer yields an empty array.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(peer_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let viewer_id = claims.sub;
    let rows = run_blocking(move || Ok(db.db.conversation(viewer_id, peer_id)?)).await?;

    let thread: Vec<ConversationMessage> = rows
        .into_iter()
        .map(|row| {
            let sender = if row.sender_id == viewer_id {
                "You".to_string()
            } else {
                // sender row can be gone after a direct delete; keep the
                // message readable anyway
                row.sender_username.unwrap_or_else(|| "unknown".to_string())
            };
            ConversationMessage {
                id: row.id,
                sender,
                content: row.content,
                attachment: row.attachment,
                timestamp: row.timestamp,
            }
        })
        .collect();

    Ok(Json(thread))
}

/// DELETE /messages/{message_id} — only the sender or an admin may delete.
/// The receiver has no delete right. The attachment file, if any, stays on
/// disk untouched.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let caller_id = claims.sub;
    let is_admin = claims.is_admin;

    run_blocking(move || {
        let message = db
            .db
            .get_message(message_id)?
            .ok_or(ApiError::NotFound("Message"))?;

        if message.sender_id != caller_id && !is_admin {
            return Err(ApiError::PermissionDenied);
        }

        // the row can vanish between the fetch and the delete; a racing
        // second delete must observe a miss, not a second success
        if !db.db.delete_message(message.id)? {
            return Err(ApiError::NotFound("Message"));
        }
        Ok(())
    })
    .await?;

    Ok(Json(StatusMessage::new("Message deleted successfully")))
}
