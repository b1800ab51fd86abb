use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use murmur_types::{
    DataResponse, FollowAction, FollowRequest, FollowSuggestion, MessageResponse,
    SuccessResponse, UnfollowResult,
};

use crate::{
    api::{require_user, ApiError, ApiResult},
    db::repositories::{FollowOutcome, FollowRepository, UserRepository, SUGGESTION_LIMIT},
    state::AppState,
};

/// POST /follow - Follow or unfollow a user
pub async fn follow_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<FollowRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let user = require_user(&state, &headers)?;
    let Json(request) = body?;

    let (target, action) = match (request.target_user_id, request.action) {
        (Some(target), Some(action)) if !action.trim().is_empty() => (target, action),
        _ => return Err(ApiError::BadRequest("Missing parameters".to_string())),
    };

    let target_id = target
        .as_local_id()
        .ok_or_else(|| ApiError::BadRequest("Invalid targetUserId".to_string()))?;

    if !UserRepository::new(state.db.pool.clone()).exists(target_id)? {
        return Err(ApiError::NotFound("Target user not found".to_string()));
    }

    let action = FollowAction::parse(action.trim())
        .ok_or_else(|| ApiError::BadRequest("Invalid action".to_string()))?;

    let follow_repo = FollowRepository::new(state.db.pool.clone());

    match action {
        FollowAction::Follow => match follow_repo.follow(user.id, target_id)? {
            FollowOutcome::Created(edge) => {
                tracing::info!(follower_id = user.id, following_id = target_id, "User followed");
                Ok((StatusCode::CREATED, Json(SuccessResponse::new(edge))).into_response())
            }
            FollowOutcome::AlreadyFollowing => Ok((
                StatusCode::OK,
                Json(MessageResponse {
                    success: true,
                    message: "Already following".to_string(),
                }),
            )
                .into_response()),
        },
        FollowAction::Unfollow => {
            let deleted = follow_repo.unfollow(user.id, target_id)?;
            Ok(Json(SuccessResponse::new(UnfollowResult { deleted })).into_response())
        }
    }
}

/// GET /follow - Users the caller might want to follow
pub async fn get_suggestions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<DataResponse<Vec<FollowSuggestion>>>> {
    let user = require_user(&state, &headers)?;

    let suggestions = FollowRepository::new(state.db.pool.clone())
        .suggest(user.id, SUGGESTION_LIMIT)?;

    Ok(Json(DataResponse::new(suggestions)))
}
