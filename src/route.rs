use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handler::{
        health_checker_handler,
        todo::{create_todo, delete_todo, get_todo, get_todos, update_todo},
        user::{login, logout, refresh_token, register, username},
    },
    middleware::mw_require_auth,
    AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Routes above each route_layer require a valid access token.
    let user_routes = Router::new()
        .route("/logout", post(logout))
        .route("/username", get(username))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/token", post(refresh_token));

    let todo_routes = Router::new()
        .route("/createusertodo", post(create_todo))
        .route("/getusertodo", get(get_todos))
        .route("/getusertodo/:id", get(get_todo))
        .route("/updateusertodo/:id", put(update_todo))
        .route("/deleteusertodo/:id", delete(delete_todo))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth));

    let cors = cors_layer(&app_state.config);

    Router::new()
        .route("/", get(health_checker_handler))
        .nest("/api/user", user_routes)
        .nest("/api/todos", todo_routes)
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// The refresh cookie is SameSite=Strict: it reaches a cross-origin,
// same-site frontend only with credentials, which browsers refuse alongside
// a wildcard origin.
fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    match config
        .cors_origin
        .as_deref()
        .map(|origin| origin.parse::<HeaderValue>())
    {
        Some(Ok(origin)) => cors.allow_origin(origin).allow_credentials(true),
        Some(Err(_)) => {
            tracing::warn!("ignoring unparsable CORS_ORIGIN, allowing any origin");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}
