use crate::Database;
use crate::models::{ConversationRow, MessageRow, UserRow};
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, params};

fn read_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        phone_number: row.get(3)?,
        status: row.get(4)?,
        profile_pic: row.get(5)?,
        is_admin: row.get(6)?,
    })
}

const USER_COLUMNS: &str =
    "id, username, password_hash, phone_number, status, profile_pic, is_admin";

impl Database {
    // -- Users --

    /// Insert a user and return the freshly assigned id.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                (username, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                    [username],
                    read_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    [id],
                    read_user,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// All users except the given one — the peer list shown to a caller.
    pub fn list_users_except(&self, id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id != ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([id], read_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
            let rows = stmt
                .query_map([], read_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Overwrite a user's editable fields. `profile_pic` is only replaced when
    /// a new filename was accepted; the other fields are written as given.
    /// Returns false when no such user exists.
    pub fn update_user_profile(
        &self,
        id: i64,
        username: &str,
        phone_number: Option<&str>,
        status: Option<&str>,
        profile_pic: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = match profile_pic {
                Some(pic) => conn.execute(
                    "UPDATE users SET username = ?1, phone_number = ?2, status = ?3, profile_pic = ?4
                     WHERE id = ?5",
                    params![username, phone_number, status, pic, id],
                )?,
                None => conn.execute(
                    "UPDATE users SET username = ?1, phone_number = ?2, status = ?3 WHERE id = ?4",
                    params![username, phone_number, status, id],
                )?,
            };
            Ok(n > 0)
        })
    }

    pub fn set_admin(&self, id: i64, is_admin: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET is_admin = ?1 WHERE id = ?2",
                params![is_admin, id],
            )?;
            Ok(())
        })
    }

    /// Delete a user together with every message they sent or received, in
    /// one transaction. Returns false when no such user exists.
    pub fn delete_user_and_messages(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM messages WHERE sender_id = ?1 OR receiver_id = ?1",
                [id],
            )?;
            let n = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(n > 0)
        })
    }

    // -- Messages --

    /// Insert a message and return the freshly assigned id. The timestamp is
    /// set by the schema default at insert time and never touched again.
    pub fn insert_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
        attachment: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, content, attachment)
                 VALUES (?1, ?2, ?3, ?4)",
                params![sender_id, receiver_id, content, attachment],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// The thread between two users: messages sent in either direction,
    /// ascending by timestamp with id as the tie-break so equal-second sends
    /// keep a stable order. The peer is not required to exist — an unknown id
    /// simply matches nothing.
    pub fn conversation(&self, viewer_id: i64, peer_id: i64) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            // LEFT JOIN so a dangling sender still yields the row
            let mut stmt = conn.prepare(
                "SELECT m.id, m.sender_id, u.username, m.content, m.attachment, m.timestamp
                 FROM messages m
                 LEFT JOIN users u ON m.sender_id = u.id
                 WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
                    OR (m.sender_id = ?2 AND m.receiver_id = ?1)
                 ORDER BY m.timestamp ASC, m.id ASC",
            )?;
            let rows = stmt
                .query_map(params![viewer_id, peer_id], |row| {
                    Ok(ConversationRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        sender_username: row.get(2)?,
                        content: row.get(3)?,
                        attachment: row.get(4)?,
                        timestamp: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, sender_id, receiver_id, content, attachment, timestamp
                     FROM messages WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(MessageRow {
                            id: row.get(0)?,
                            sender_id: row.get(1)?,
                            receiver_id: row.get(2)?,
                            content: row.get(3)?,
                            attachment: row.get(4)?,
                            timestamp: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Remove a message row. Returns false when the id no longer exists, so a
    /// racing second delete observes a clean miss rather than an error.
    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn backdate(db: &Database, message_id: i64, timestamp: &str) {
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET timestamp = ?1 WHERE id = ?2",
                params![timestamp, message_id],
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn message_ids_are_monotonic() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();
        let bob = db.create_user("bob", "hash").unwrap();

        let first = db.insert_message(alice, bob, "one", None).unwrap();
        let second = db.insert_message(alice, bob, "two", None).unwrap();
        let third = db.insert_message(bob, alice, "three", None).unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn conversation_is_symmetric() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();
        let bob = db.create_user("bob", "hash").unwrap();
        let carol = db.create_user("carol", "hash").unwrap();

        db.insert_message(alice, bob, "a to b", None).unwrap();
        db.insert_message(bob, alice, "b to a", None).unwrap();
        db.insert_message(alice, carol, "a to c", None).unwrap();

        let from_alice = db.conversation(alice, bob).unwrap();
        let from_bob = db.conversation(bob, alice).unwrap();

        let ids_a: Vec<i64> = from_alice.iter().map(|m| m.id).collect();
        let ids_b: Vec<i64> = from_bob.iter().map(|m| m.id).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(ids_a.len(), 2);
    }

    #[test]
    fn conversation_orders_by_timestamp_then_id() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();
        let bob = db.create_user("bob", "hash").unwrap();

        let newest = db.insert_message(alice, bob, "newest", None).unwrap();
        let oldest = db.insert_message(bob, alice, "oldest", None).unwrap();
        let tied_first = db.insert_message(alice, bob, "tied first", None).unwrap();
        let tied_second = db.insert_message(alice, bob, "tied second", None).unwrap();

        backdate(&db, oldest, "2026-01-01 08:00:00");
        backdate(&db, tied_first, "2026-01-01 09:00:00");
        backdate(&db, tied_second, "2026-01-01 09:00:00");
        backdate(&db, newest, "2026-01-01 10:00:00");

        let thread = db.conversation(alice, bob).unwrap();
        let ids: Vec<i64> = thread.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![oldest, tied_first, tied_second, newest]);
    }

    #[test]
    fn conversation_with_unknown_peer_is_empty() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();
        let bob = db.create_user("bob", "hash").unwrap();
        db.insert_message(alice, bob, "hi", None).unwrap();

        assert!(db.conversation(alice, 999).unwrap().is_empty());
    }

    #[test]
    fn empty_content_and_self_messages_are_permitted() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();

        let id = db.insert_message(alice, alice, "", None).unwrap();
        let thread = db.conversation(alice, alice).unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, id);
        assert_eq!(thread[0].content, "");
        assert!(thread[0].attachment.is_none());
    }

    #[test]
    fn delete_message_misses_cleanly_on_second_call() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();
        let bob = db.create_user("bob", "hash").unwrap();
        let id = db.insert_message(alice, bob, "bye", None).unwrap();

        assert!(db.delete_message(id).unwrap());
        assert!(!db.delete_message(id).unwrap());
        assert!(db.get_message(id).unwrap().is_none());
    }

    #[test]
    fn deleting_a_user_removes_their_messages() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();
        let bob = db.create_user("bob", "hash").unwrap();
        let carol = db.create_user("carol", "hash").unwrap();

        db.insert_message(alice, bob, "a to b", None).unwrap();
        db.insert_message(bob, alice, "b to a", None).unwrap();
        let kept = db.insert_message(bob, carol, "b to c", None).unwrap();

        assert!(db.delete_user_and_messages(alice).unwrap());
        assert!(db.get_user_by_id(alice).unwrap().is_none());
        assert!(db.conversation(bob, alice).unwrap().is_empty());

        let survivors = db.conversation(bob, carol).unwrap();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id, kept);

        assert!(!db.delete_user_and_messages(alice).unwrap());
    }

    #[test]
    fn profile_update_keeps_picture_unless_replaced() {
        let db = test_db();
        let alice = db.create_user("alice", "hash").unwrap();

        assert!(
            db.update_user_profile(alice, "alice", Some("555-0100"), None, Some("alice.png"))
                .unwrap()
        );
        assert!(
            db.update_user_profile(alice, "alicia", None, Some("away"), None)
                .unwrap()
        );

        let user = db.get_user_by_id(alice).unwrap().unwrap();
        assert_eq!(user.username, "alicia");
        assert_eq!(user.phone_number, None);
        assert_eq!(user.status.as_deref(), Some("away"));
        assert_eq!(user.profile_pic.as_deref(), Some("alice.png"));

        assert!(!db.update_user_profile(999, "ghost", None, None, None).unwrap());
    }
}
