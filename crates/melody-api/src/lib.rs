pub mod auth;
pub mod error;
pub mod messages;
pub mod moments;
pub mod time;
pub mod todos;
pub mod uploads;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::error;

use melody_db::Database;

use crate::error::ApiError;
use crate::uploads::UploadDir;

/// Request body ceiling, large enough for short video clips.
pub const MAX_BODY_SIZE: usize = 100 * 1024 * 1024;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub uploads: UploadDir,
    /// Page served at `/`.
    pub index_path: PathBuf,
}

/// Build the full application router: JSON API, index page and uploaded media.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/messages", get(messages::list_messages).post(messages::post_message))
        .route("/api/moments", get(moments::list_moments).post(moments::post_moment))
        .route("/api/todos", get(todos::list_todos).post(todos::add_todo))
        .route("/api/todos/{id}", delete(todos::delete_todo))
        .route("/health", get(health))
        .with_state(state.clone());

    Router::new()
        .merge(api)
        .route_service("/", ServeFile::new(&state.index_path))
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Run blocking database work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}
