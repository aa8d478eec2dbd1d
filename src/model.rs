use chrono::{DateTime, Utc};
use serde::Serialize;

// Stored user record. Never serialized directly: it holds the password hash
// and the current refresh token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Public view of a user, returned from registration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

// Data model representing a Todo item
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller, attached to the request by `mw_require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}
