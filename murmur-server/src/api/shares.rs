use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use murmur_types::{CreateShareRequest, DataResponse, Share, SuccessResponse};

use crate::{
    api::{require_user, ApiError, ApiResult, PostIdQuery},
    db::repositories::{ShareRepository, SHARE_LIST_LIMIT},
    state::AppState,
};

/// POST /shares - Share a post with an optional caption
pub async fn create_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateShareRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Share>>)> {
    let user = require_user(&state, &headers)?;
    let Json(request) = body?;
    let post_id = request
        .post_id
        .ok_or_else(|| ApiError::BadRequest("postId is required".to_string()))?;

    let share = ShareRepository::new(state.db.pool.clone()).create(
        user.id,
        post_id,
        request.caption.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(share))))
}

/// GET /shares?postId= - Shares of a post
pub async fn list_shares(
    State(state): State<AppState>,
    Query(query): Query<PostIdQuery>,
) -> ApiResult<Json<DataResponse<Vec<Share>>>> {
    let post_id = query.require()?;
    let shares = ShareRepository::new(state.db.pool.clone()).list_for_post(post_id, SHARE_LIST_LIMIT)?;
    Ok(Json(DataResponse::new(shares)))
}
