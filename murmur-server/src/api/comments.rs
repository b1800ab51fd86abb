use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use murmur_types::{
    Comment, CreateCommentRequest, DataResponse, SuccessResponse, UpdateCommentRequest,
};

use crate::{
    api::{parse_id, require_user, ApiError, ApiResult, PostIdQuery},
    db::repositories::{CommentRepository, COMMENT_LIST_LIMIT},
    state::AppState,
};

/// POST /comments - Comment on a post or reply to a comment
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Comment>>)> {
    let user = require_user(&state, &headers)?;
    let Json(request) = body?;
    let post_id = request
        .post_id
        .ok_or_else(|| ApiError::BadRequest("postId is required".to_string()))?;

    let comment = CommentRepository::new(state.db.pool.clone()).create(
        user.id,
        post_id,
        request.content.as_deref().unwrap_or_default(),
        request.parent_comment_id,
    )?;

    tracing::debug!(comment_id = comment.id, post_id, "Comment created");

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(comment))))
}

/// GET /comments?postId= - Comments on a post
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<PostIdQuery>,
) -> ApiResult<Json<DataResponse<Vec<Comment>>>> {
    let post_id = query.require()?;
    let comments =
        CommentRepository::new(state.db.pool.clone()).list_for_post(post_id, COMMENT_LIST_LIMIT)?;
    Ok(Json(DataResponse::new(comments)))
}

/// PATCH /comments/:id - Edit a comment (author only)
pub async fn update_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse<Comment>>> {
    let user = require_user(&state, &headers)?;
    let comment_id = parse_id(&id, "comment id")?;
    let Json(request) = body?;

    let comment = CommentRepository::new(state.db.pool.clone()).update(
        comment_id,
        user.id,
        request.content.as_deref().unwrap_or_default(),
    )?;

    Ok(Json(SuccessResponse::new(comment)))
}

/// DELETE /comments/:id - Remove a comment (author only)
pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse<Comment>>> {
    let user = require_user(&state, &headers)?;
    let comment_id = parse_id(&id, "comment id")?;

    let deleted = CommentRepository::new(state.db.pool.clone()).delete(comment_id, user.id)?;

    tracing::debug!(comment_id, user_id = user.id, "Comment deleted");

    Ok(Json(SuccessResponse::new(deleted)))
}
