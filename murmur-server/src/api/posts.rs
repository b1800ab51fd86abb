use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use murmur_types::{DataResponse, FeedPost, Post, PostWithAuthor, SuccessResponse};

use crate::{
    api::{optional_user, parse_id, require_user, ApiError, ApiResult},
    db::repositories::{NewPost, PostRepository, FEED_LIMIT},
    state::AppState,
    storage::{upload_post_media, MediaFile},
};

/// Fields collected from the create-post form
#[derive(Debug, Default)]
struct PostForm {
    content: String,
    image: Option<MediaFile>,
    video: Option<MediaFile>,
    is_public: bool,
}

/// Anything but an explicit false value keeps the post public
fn parse_visibility(raw: &str) -> bool {
    !matches!(raw.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off" | "no")
}

async fn read_form(mut multipart: Multipart) -> ApiResult<PostForm> {
    let mut form = PostForm {
        is_public: true,
        ..PostForm::default()
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "content" => form.content = field.text().await?,
            "isPublic" => form.is_public = parse_visibility(&field.text().await?),
            "image" | "video" => {
                let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if bytes.is_empty() {
                    continue;
                }
                let file = Some(MediaFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
                if name == "image" {
                    form.image = file;
                } else {
                    form.video = file;
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// POST /userposts - Create a post from a multipart form
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Post>>)> {
    let user = require_user(&state, &headers)?;
    let form = read_form(multipart?).await?;

    // Checked before uploading so a rejected post leaves no stray media
    if form.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }

    let (image_url, video_url) =
        upload_post_media(state.object_store.as_ref(), user.id, form.image, form.video).await?;

    let post = PostRepository::new(state.db.pool.clone()).create(&NewPost {
        user_id: user.id,
        content: form.content,
        image_url,
        video_url,
        is_public: form.is_public,
    })?;

    tracing::info!(post_id = post.id, user_id = user.id, "Post created");

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(post))))
}

/// GET /userposts - Public feed with engagement counts
pub async fn get_feed(
    State(state): State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<FeedPost>>>> {
    let feed = PostRepository::new(state.db.pool.clone()).list_feed(FEED_LIMIT)?;
    Ok(Json(DataResponse::new(feed)))
}

/// GET /userposts/:id - A single post with its author
pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<PostWithAuthor>>> {
    let post_id = parse_id(&id, "post id")?;

    let post = PostRepository::new(state.db.pool.clone())
        .get_by_id(post_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    // Private posts are only visible to their author
    if !post.post.is_public {
        let viewer = optional_user(&state, &headers);
        if viewer.map(|u| u.id) != Some(post.post.user_id) {
            return Err(ApiError::NotFound("Post not found".to_string()));
        }
    }

    Ok(Json(DataResponse::new(post)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_visibility() {
        for raw in ["true", "1", "", "yes", "on"] {
            assert!(parse_visibility(raw), "{:?} should be public", raw);
        }
        for raw in ["false", "FALSE", " 0 ", "off", "no"] {
            assert!(!parse_visibility(raw), "{:?} should be private", raw);
        }
    }
}
