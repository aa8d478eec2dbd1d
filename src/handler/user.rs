use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    error::AppError,
    model::{CurrentUser, UserResponse},
    schema::{AccessTokenResponse, CredentialsSchema, UsernameResponse},
    AppState,
};

pub const REFRESH_COOKIE: &str = "refreshToken";

// Handler for registering a new user
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    require_credentials(&body)?;

    if state.db.find_user_by_username(&body.username).await?.is_some() {
        return Err(AppError::UsernameTaken);
    }

    let cost = state.config.bcrypt_cost;
    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))??;

    // The lookup above can race with a concurrent registration; the unique
    // index settles it.
    let user = state
        .db
        .create_user(&body.username, &password_hash)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => AppError::UsernameTaken,
            _ => AppError::Database(err),
        })?;

    tracing::info!("registered user {} ({})", user.username, user.id);
    Ok(Json(UserResponse::from(user)))
}

// Handler for logging in; issues both tokens
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    require_credentials(&body)?;

    let user = state
        .db
        .find_user_by_username(&body.username)
        .await?
        .ok_or_else(|| {
            tracing::warn!("login for unknown user {}", body.username);
            AppError::InvalidCredentials
        })?;

    let password = body.password;
    let password_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("password verification task failed: {e}")))??;
    if !valid {
        tracing::warn!("invalid password for user {}", user.username);
        return Err(AppError::InvalidCredentials);
    }

    let access_token = state
        .tokens
        .issue_access_token(&user.id)
        .map_err(AppError::Token)?;
    let refresh_token = state
        .tokens
        .issue_refresh_token(&user.id)
        .map_err(AppError::Token)?;

    // Storing the new token supersedes any earlier session.
    if !state
        .db
        .set_refresh_token(&user.id, Some(&refresh_token))
        .await?
    {
        return Err(AppError::user_not_found());
    }

    tracing::info!("user {} logged in", user.username);
    Ok((
        [(header::SET_COOKIE, refresh_cookie(&state, &refresh_token))],
        Json(AccessTokenResponse { access_token }),
    ))
}

// Handler for exchanging the refresh cookie for a new token pair
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let presented = cookie_value(&headers, REFRESH_COOKIE)
        .ok_or(AppError::Unauthorized("Missing refresh token"))?;

    let claims = state.tokens.verify_refresh_token(presented).map_err(|err| {
        tracing::warn!("rejected refresh token: {}", err);
        AppError::Forbidden("Invalid refresh token")
    })?;

    let access_token = state
        .tokens
        .issue_access_token(&claims.user_id)
        .map_err(AppError::Token)?;
    let next_refresh = state
        .tokens
        .issue_refresh_token(&claims.user_id)
        .map_err(AppError::Token)?;

    if !state
        .db
        .rotate_refresh_token(&claims.user_id, presented, &next_refresh)
        .await?
    {
        tracing::warn!(
            "refresh token for user {} is not the current one",
            claims.user_id
        );
        return Err(AppError::Forbidden("Refresh token has been revoked"));
    }

    tracing::debug!("rotated refresh token for user {}", claims.user_id);
    Ok((
        [(header::SET_COOKIE, refresh_cookie(&state, &next_refresh))],
        Json(AccessTokenResponse { access_token }),
    ))
}

// Handler for logging out; revokes the stored refresh token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .db
        .set_refresh_token(&current_user.user_id, None)
        .await?
    {
        return Err(AppError::user_not_found());
    }

    tracing::info!("user {} logged out", current_user.user_id);
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_refresh_cookie(&state))],
    ))
}

// Handler for looking up the caller's username
pub async fn username(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .find_user_by_id(&current_user.user_id)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    Ok(Json(UsernameResponse {
        username: user.username,
    }))
}

fn require_credentials(body: &CredentialsSchema) -> Result<(), AppError> {
    if body.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if body.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }
    Ok(())
}

fn refresh_cookie(state: &AppState, token: &str) -> String {
    let max_age = state.tokens.refresh_ttl().num_seconds();
    let mut cookie = format!(
        "{REFRESH_COOKIE}={token}; HttpOnly; Path=/; SameSite=Strict; Max-Age={max_age}"
    );
    if state.config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_refresh_cookie(state: &AppState) -> String {
    let mut cookie = format!("{REFRESH_COOKIE}=; HttpOnly; Path=/; SameSite=Strict; Max-Age=0");
    if state.config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Finds a cookie by name across all `Cookie` headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_refresh_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc.def; lang=en"),
        );
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), Some("abc.def"));
    }

    #[test]
    fn empty_or_missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn searches_every_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("refreshToken=xyz"));
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), Some("xyz"));
    }
}
