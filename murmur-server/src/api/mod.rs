pub mod comment_likes;
pub mod comments;
pub mod error;
pub mod follow;
pub mod likes;
pub mod posts;
pub mod shares;
pub mod users;

pub use error::{ApiError, ApiResult};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderMap,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;

use murmur_types::User;

use crate::state::AppState;

/// Largest accepted create-post form, media included
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Resolve the caller or fail with 401
pub fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<User> {
    state.current_user(headers).ok_or_else(ApiError::unauthorized)
}

/// Resolve the caller for endpoints that also serve anonymous requests
pub fn optional_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    state.current_user(headers)
}

/// Parse a numeric id taken from a path segment or query string
pub fn parse_id(raw: &str, label: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {}", label)))
}

/// `?postId=` query used by the read endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIdQuery {
    pub post_id: Option<String>,
}

impl PostIdQuery {
    pub fn require(&self) -> ApiResult<i64> {
        match self.post_id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_id(raw, "postId"),
            _ => Err(ApiError::BadRequest("postId is required".to_string())),
        }
    }
}

/// API routes without any prefix
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/follow", get(follow::get_suggestions).post(follow::follow_action))
        .route("/likes", get(likes::get_like_status).post(likes::toggle_like))
        .route("/comments", get(comments::list_comments).post(comments::create_comment))
        .route(
            "/comments/:id",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/commentLikes", post(comment_likes::toggle_comment_like))
        .route("/shares", get(shares::list_shares).post(shares::create_share))
        .route(
            "/userposts",
            get(posts::get_feed)
                .post(posts::create_post)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/userposts/:id", get(posts::get_post))
        .route("/users/:id", get(users::get_profile))
}

/// Full application router: API routes nested under `base_path`, plus `/health`
pub fn router(state: AppState, base_path: &str) -> Router {
    let api = if base_path.is_empty() {
        api_routes()
    } else {
        Router::new().nest(base_path, api_routes())
    };

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
