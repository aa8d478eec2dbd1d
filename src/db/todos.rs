use chrono::Utc;

use super::Database;
use crate::model::Todo;

const TODO_COLUMNS: &str = "id, user_id, content, completed, created_at";

// Every query below filters on user_id; callers pass the authenticated owner.
impl Database {
    pub async fn create_todo(&self, user_id: &str, content: &str) -> Result<Todo, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (id, user_id, content, completed, created_at) \
             VALUES (?, ?, ?, 0, ?) RETURNING {TODO_COLUMNS}"
        ))
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_todos(&self, user_id: &str) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = ? ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_todo(&self, user_id: &str, id: &str) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Applies whichever of `content` / `completed` is present.
    pub async fn update_todo(
        &self,
        user_id: &str,
        id: &str,
        content: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET content = COALESCE(?, content), completed = COALESCE(?, completed) \
             WHERE id = ? AND user_id = ? RETURNING {TODO_COLUMNS}"
        ))
        .bind(content)
        .bind(completed)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_todo(&self, user_id: &str, id: &str) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(&format!(
            "DELETE FROM todos WHERE id = ? AND user_id = ? RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn database() -> Database {
        let db = Database::connect("sqlite::memory:", 1).await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn todos_are_scoped_to_their_owner() {
        let db = database().await;
        let alice = db.create_user("alice", "hash").await.unwrap();
        let bob = db.create_user("bob", "hash").await.unwrap();

        let todo = db.create_todo(&alice.id, "buy milk").await.unwrap();
        assert!(!todo.completed);
        assert_eq!(todo.user_id, alice.id);

        assert!(db.find_todo(&bob.id, &todo.id).await.unwrap().is_none());
        assert!(db.list_todos(&bob.id).await.unwrap().is_empty());
        assert!(db
            .update_todo(&bob.id, &todo.id, Some("hijacked"), Some(true))
            .await
            .unwrap()
            .is_none());
        assert!(db.delete_todo(&bob.id, &todo.id).await.unwrap().is_none());

        let stored = db.find_todo(&alice.id, &todo.id).await.unwrap().unwrap();
        assert_eq!(stored, todo);
    }

    #[tokio::test]
    async fn partial_update_keeps_missing_fields() {
        let db = database().await;
        let alice = db.create_user("alice", "hash").await.unwrap();
        let todo = db.create_todo(&alice.id, "buy milk").await.unwrap();

        let updated = db
            .update_todo(&alice.id, &todo.id, None, Some(true))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "buy milk");
        assert!(updated.completed);

        let updated = db
            .update_todo(&alice.id, &todo.id, Some("buy oat milk"), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "buy oat milk");
        assert!(updated.completed);
    }

    #[tokio::test]
    async fn todo_requires_existing_owner() {
        let db = database().await;
        assert!(db.create_todo("no-such-user", "orphan").await.is_err());
    }
}
