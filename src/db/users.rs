use chrono::Utc;

use super::Database;
use crate::model::User;

const USER_COLUMNS: &str = "id, username, password_hash, refresh_token, created_at";

impl Database {
    /// Inserts a new user. A duplicate username surfaces as a unique
    /// violation from the database.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, password_hash, refresh_token, created_at) \
             VALUES (?, ?, ?, NULL, ?) RETURNING {USER_COLUMNS}"
        ))
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Overwrites the stored refresh token (or clears it with `None`).
    /// Returns false if the user no longer exists.
    pub async fn set_refresh_token(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Replaces `current` with `next` only if `current` is still the stored
    /// token. Of two concurrent rotations presenting the same token, one wins.
    pub async fn rotate_refresh_token(
        &self,
        user_id: &str,
        current: &str,
        next: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ? WHERE id = ? AND refresh_token = ?",
        )
        .bind(next)
        .bind(user_id)
        .bind(current)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
