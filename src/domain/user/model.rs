use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Role value that the login flow accepts
pub const ADMIN_ROLE: &str = "admin";

/// User model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Always stored lower-cased
    pub username: String,
    /// Stored and compared as submitted (plaintext)
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `Some` once the user is soft-deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Usernames are case-insensitive; this is the stored/compared form.
pub fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}
