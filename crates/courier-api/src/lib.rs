pub mod admin;
pub mod attachments;
pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod profile;
pub mod users;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::services::ServeDir;

use crate::auth::AppState;
use crate::error::ApiError;

/// Full API router: public auth routes, token-protected routes, and the two
/// static mounts attachments and profile pictures are served from.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::get_user))
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/messages", post(messages::send_message))
        .route(
            "/messages/{id}",
            get(messages::get_conversation).delete(messages::delete_message),
        )
        .route("/admin/users", get(admin::list_users))
        .route(
            "/admin/users/{user_id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state.clone());

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .nest_service("/profile_pics", ServeDir::new(&state.profile_pic_dir))
}

/// Run a blocking DB call off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("blocking task join error: {}", e)))?
}
