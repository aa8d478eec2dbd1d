use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    error::AppError,
    model::CurrentUser,
    schema::{CreateTodoSchema, UpdateTodoSchema},
    AppState,
};

// Handler for creating a new Todo owned by the caller
pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    payload: Result<Json<CreateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    if body.content.trim().is_empty() {
        return Err(AppError::Validation("Todo content is required".to_string()));
    }

    let todo = state
        .db
        .create_todo(&current_user.user_id, &body.content)
        .await
        .map_err(|err| match err.as_database_error() {
            // The token outlived its user.
            Some(db_err) if db_err.is_foreign_key_violation() => AppError::user_not_found(),
            _ => AppError::Database(err),
        })?;

    tracing::debug!("user {} created todo {}", current_user.user_id, todo.id);
    Ok(Json(todo))
}

// Handler for getting all of the caller's Todo items
pub async fn get_todos(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let todos = state.db.list_todos(&current_user.user_id).await?;
    Ok(Json(todos))
}

// Handler for getting a specific Todo by ID
pub async fn get_todo(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let todo = state
        .db
        .find_todo(&current_user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::todo_not_found(&id))?;

    Ok(Json(todo))
}

// Handler for updating a Todo by ID; absent fields are left untouched
pub async fn update_todo(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    payload: Result<Json<UpdateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    if matches!(&body.content, Some(content) if content.trim().is_empty()) {
        return Err(AppError::Validation("Todo content cannot be empty".to_string()));
    }

    let todo = state
        .db
        .update_todo(
            &current_user.user_id,
            &id,
            body.content.as_deref(),
            body.completed,
        )
        .await?
        .ok_or_else(|| AppError::todo_not_found(&id))?;

    Ok(Json(todo))
}

// Handler for deleting a Todo by ID; returns the removed record
pub async fn delete_todo(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let todo = state
        .db
        .delete_todo(&current_user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::todo_not_found(&id))?;

    tracing::debug!("user {} deleted todo {}", current_user.user_id, todo.id);
    Ok(Json(todo))
}
