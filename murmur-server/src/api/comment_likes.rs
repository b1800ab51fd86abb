use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use murmur_types::{CommentLikeRequest, LikeAction, LikeToggle, SuccessResponse};

use crate::{
    api::{require_user, ApiError, ApiResult},
    db::repositories::LikeRepository,
    state::AppState,
};

/// POST /commentLikes - Toggle the caller's like on a comment
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CommentLikeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<LikeToggle>>)> {
    let user = require_user(&state, &headers)?;
    let Json(request) = body?;
    let comment_id = request
        .comment_id
        .ok_or_else(|| ApiError::BadRequest("commentId is required".to_string()))?;

    let toggled =
        LikeRepository::for_comments(state.db.pool.clone()).toggle(user.id, comment_id)?;

    let status = if toggled.action == LikeAction::Liked {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(SuccessResponse::new(toggled))))
}
