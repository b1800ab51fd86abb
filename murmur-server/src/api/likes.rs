use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use murmur_types::{DataResponse, LikeAction, LikeRequest, LikeStatus, LikeToggleResponse};

use crate::{
    api::{optional_user, require_user, ApiError, ApiResult, PostIdQuery},
    db::repositories::LikeRepository,
    state::AppState,
};

/// POST /likes - Like a post, or remove the caller's like
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<LikeToggleResponse>)> {
    let user = require_user(&state, &headers)?;
    let Json(request) = body?;
    let post_id = request
        .post_id
        .ok_or_else(|| ApiError::BadRequest("postId is required".to_string()))?;

    let toggled = LikeRepository::for_posts(state.db.pool.clone()).toggle(user.id, post_id)?;

    let status = match toggled.action {
        LikeAction::Liked => StatusCode::CREATED,
        LikeAction::Unliked => StatusCode::OK,
    };

    Ok((
        status,
        Json(LikeToggleResponse {
            success: true,
            action: toggled.action,
            count: toggled.count,
        }),
    ))
}

/// GET /likes?postId= - Like count, and whether the caller likes the post
pub async fn get_like_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PostIdQuery>,
) -> ApiResult<Json<DataResponse<LikeStatus>>> {
    let post_id = query.require()?;
    let viewer = optional_user(&state, &headers);

    let status = LikeRepository::for_posts(state.db.pool.clone())
        .status(post_id, viewer.map(|u| u.id))?;

    Ok(Json(DataResponse::new(status)))
}
