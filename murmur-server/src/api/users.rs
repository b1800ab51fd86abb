use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};

use murmur_types::{DataResponse, ProfileUser, UserProfile};

use crate::{
    api::{optional_user, ApiError, ApiResult},
    db::repositories::{FollowRepository, PostRepository, UserRepository, FEED_LIMIT},
    state::AppState,
};

/// GET /users/:id - Profile by local numeric id or external principal id
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<UserProfile>>> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("Invalid user id".to_string()));
    }

    // Resolved first so a caller's first request can view their own profile
    let viewer_id = optional_user(&state, &headers).map(|u| u.id);

    let user_repo = UserRepository::new(state.db.pool.clone());
    let user = match id.parse::<i64>() {
        Ok(local_id) => user_repo.get_by_id(local_id)?,
        Err(_) => user_repo.get_by_external_id(id)?,
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let is_self = viewer_id == Some(user.id);

    let posts = PostRepository::new(state.db.pool.clone())
        .list_by_author(user.id, is_self, FEED_LIMIT)?;

    let follow_repo = FollowRepository::new(state.db.pool.clone());
    let follower_count = follow_repo.follower_count(user.id)?;
    let following_count = follow_repo.following_count(user.id)?;
    let is_following = match viewer_id {
        Some(viewer) if !is_self => follow_repo.is_following(viewer, user.id)?,
        _ => false,
    };

    Ok(Json(DataResponse::new(UserProfile {
        user: ProfileUser::from(user),
        posts,
        follower_count,
        following_count,
        is_following,
    })))
}
