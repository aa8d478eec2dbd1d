use std::sync::Arc;

use axum::{
    extract::State,
    http::{self, Request},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, model::CurrentUser, token::TokenError, AppState};

/// Verifies the `Authorization: Bearer <access token>` header and attaches the
/// caller as a `CurrentUser` extension. Every failure is a 401.
pub async fn mw_require_auth<B>(
    State(state): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AppError::Unauthorized("Missing access token"))?;

    let token = bearer_token(auth_header)
        .ok_or(AppError::Unauthorized("Malformed Authorization header"))?;

    match state.tokens.verify_access_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(CurrentUser {
                user_id: claims.user_id,
            });
        }
        Err(TokenError::Expired) => {
            tracing::debug!("rejected expired access token");
            return Err(AppError::Unauthorized("Access token expired"));
        }
        Err(err) => {
            tracing::warn!("rejected access token: {}", err);
            return Err(AppError::Unauthorized("Invalid access token"));
        }
    }

    Ok(next.run(request).await)
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer   abc"), Some("abc"));
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }
}
