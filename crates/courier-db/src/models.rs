/// Database row types — these map directly to SQLite rows.
/// Distinct from courier-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub status: Option<String>,
    pub profile_pic: Option<String>,
    pub is_admin: bool,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub attachment: Option<String>,
    pub timestamp: String,
}

/// Conversation query result: the sender's username is resolved by JOIN.
/// `sender_username` is None when the sender row is gone (dangling reference
/// after a direct row delete); callers render a fallback name.
pub struct ConversationRow {
    pub id: i64,
    pub sender_id: i64,
    pub sender_username: Option<String>,
    pub content: String,
    pub attachment: Option<String>,
    pub timestamp: String,
}
