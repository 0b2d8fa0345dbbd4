use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims shared between the auth handlers (token issuance) and the
/// request middleware (token validation). Canonical definition lives here in
/// courier-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub is_admin: bool,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: i64,
    pub is_admin: bool,
}

// -- Users --

/// Entry in the peer listing (`GET /users`) — everyone except the caller.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub profile_pic: Option<String>,
}

/// Full user record as returned by profile and admin routes.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub phone_number: Option<String>,
    pub status: Option<String>,
    pub profile_pic: Option<String>,
    pub is_admin: bool,
}

// -- Messages --

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: String,
    pub message_id: i64,
}

/// One entry of a conversation thread, projected for the viewer: `sender`
/// is the literal string "You" for the viewer's own messages, otherwise the
/// sender's username.
#[derive(Debug, Serialize)]
pub struct ConversationMessage {
    pub id: i64,
    pub sender: String,
    pub content: String,
    pub attachment: Option<String>,
    pub timestamp: String,
}

// -- Generic --

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
