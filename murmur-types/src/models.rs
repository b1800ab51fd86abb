use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{LikeAction, UserRole};

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub is_public: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

/// A post joined with the display fields of its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub user_name: String,
    pub user_image: Option<String>,
}

/// Engagement totals for a post, always counted from the engagement tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementCounts {
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
}

/// Feed entry: post, author fields and engagement counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: PostWithAuthor,
    #[serde(flatten)]
    pub counts: EngagementCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    pub id: Option<i64>,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    /// Comment this one replies to (None for top-level comments)
    pub parent_comment_id: Option<i64>,
    /// Number of comment-like rows at read time
    pub likes_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
    pub author: CommentAuthor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub caption: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub id: i64,
    pub follower_id: i64,
    pub following_id: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowSuggestion {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub follower_count: i64,
    pub is_following: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub action: LikeAction,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub email: String,
}

impl From<User> for ProfileUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            image: user.image,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user: ProfileUser,
    pub posts: Vec<Post>,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnfollowResult {
    pub deleted: usize,
}

// Request/Response types for API

/// A user reference that may arrive as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserIdParam {
    Number(i64),
    Text(String),
}

impl UserIdParam {
    /// Local numeric id, if the value is one
    pub fn as_local_id(&self) -> Option<i64> {
        match self {
            UserIdParam::Number(n) => Some(*n),
            UserIdParam::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    #[serde(default)]
    pub target_user_id: Option<UserIdParam>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[serde(default)]
    pub post_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLikeRequest {
    #[serde(default)]
    pub comment_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Body for mutating endpoints: `{"success": true, "data": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body for read endpoints: `{"data": ...}`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeToggleResponse {
    pub success: bool,
    pub action: LikeAction,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_param_accepts_number_and_string() {
        let n: UserIdParam = serde_json::from_str("42").unwrap();
        assert_eq!(n.as_local_id(), Some(42));

        let s: UserIdParam = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(s.as_local_id(), Some(17));

        let bad: UserIdParam = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(bad.as_local_id(), None);
    }

    #[test]
    fn test_feed_post_serializes_flat_camel_case() {
        let now = Utc::now();
        let feed = FeedPost {
            post: PostWithAuthor {
                post: Post {
                    id: 1,
                    user_id: 2,
                    content: "hello".to_string(),
                    image_url: None,
                    video_url: None,
                    is_public: true,
                    created_at: now,
                    updated_at: now,
                },
                user_name: "Ada".to_string(),
                user_image: None,
            },
            counts: EngagementCounts {
                likes_count: 3,
                comments_count: 1,
                shares_count: 0,
            },
        };

        let value = serde_json::to_value(&feed).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["userId"], 2);
        assert_eq!(value["userName"], "Ada");
        assert_eq!(value["likesCount"], 3);
        assert_eq!(value["isPublic"], true);
        assert_eq!(value["createdAt"], now.to_rfc3339());
    }
}
