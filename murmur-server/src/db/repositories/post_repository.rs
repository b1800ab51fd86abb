use anyhow::{Context, Result};
use rusqlite::{params_from_iter, OptionalExtension, Row};
use std::collections::HashMap;

use murmur_types::{EngagementCounts, FeedPost, Post, PostWithAuthor};

use super::{db_timestamp, now, placeholders, timestamp_column};
use crate::db::{DbPool, StoreError, StoreResult};

/// Maximum number of posts returned by the feed and by profiles
pub const FEED_LIMIT: i64 = 50;

const POST_COLUMNS: &str =
    "p.id, p.user_id, p.content, p.image_url, p.video_url, p.is_public, p.created_at, p.updated_at";

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        video_url: row.get(4)?,
        is_public: row.get::<_, i64>(5)? == 1,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

fn map_post_with_author(row: &Row<'_>) -> rusqlite::Result<PostWithAuthor> {
    let user_name: Option<String> = row.get(8)?;
    Ok(PostWithAuthor {
        post: map_post(row)?,
        user_name: user_name.unwrap_or_else(|| murmur_types::UNKNOWN_NAME.to_string()),
        user_image: row.get(9)?,
    })
}

/// Values for a post about to be inserted
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub is_public: bool,
}

impl NewPost {
    /// A public post without media
    pub fn text(user_id: i64, content: impl Into<String>) -> Self {
        Self {
            user_id,
            content: content.into(),
            image_url: None,
            video_url: None,
            is_public: true,
        }
    }
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub fn create(&self, new_post: &NewPost) -> StoreResult<Post> {
        if new_post.content.trim().is_empty() {
            return Err(StoreError::InvalidArgument("Content is required".to_string()));
        }

        let conn = self.pool.get()?;
        let now = now();
        conn.execute(
            "INSERT INTO posts (user_id, content, image_url, video_url, is_public, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                new_post.user_id,
                &new_post.content,
                &new_post.image_url,
                &new_post.video_url,
                new_post.is_public as i64,
                db_timestamp(&now),
                db_timestamp(&now),
            ),
        )
        .context("Failed to create post")?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            user_id: new_post.user_id,
            content: new_post.content.clone(),
            image_url: new_post.image_url.clone(),
            video_url: new_post.video_url.clone(),
            is_public: new_post.is_public,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a single post with its author's display fields
    pub fn get_by_id(&self, post_id: i64) -> Result<Option<PostWithAuthor>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!(
                    "SELECT {}, u.name, u.image
                     FROM posts p
                     LEFT JOIN users u ON p.user_id = u.id
                     WHERE p.id = ?",
                    POST_COLUMNS
                ),
                [post_id],
                map_post_with_author,
            )
            .optional()?;
        Ok(post)
    }

    /// Public feed, newest first, with engagement counts attached
    pub fn list_feed(&self, limit: i64) -> Result<Vec<FeedPost>> {
        let posts = {
            let conn = self.pool.get()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, u.name, u.image
                 FROM posts p
                 LEFT JOIN users u ON p.user_id = u.id
                 WHERE p.is_public = 1
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT ?",
                POST_COLUMNS
            ))?;
            let posts = stmt
                .query_map([limit], map_post_with_author)?
                .collect::<Result<Vec<_>, _>>()?;
            posts
        };

        let ids: Vec<i64> = posts.iter().map(|p| p.post.id).collect();
        let mut counts = self.engagement_counts(&ids)?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let counts = counts.remove(&post.post.id).unwrap_or_default();
                FeedPost { post, counts }
            })
            .collect())
    }

    /// Posts by one author, newest first
    pub fn list_by_author(&self, user_id: i64, include_private: bool, limit: i64) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}
             FROM posts p
             WHERE p.user_id = ?1 AND (?2 OR p.is_public = 1)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?3",
            POST_COLUMNS
        ))?;

        let posts = stmt
            .query_map((user_id, include_private, limit), map_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Likes, comments and shares for a set of posts.
    ///
    /// One grouped query per engagement table regardless of how many posts
    /// are asked for. Posts without engagement are absent from the map.
    pub fn engagement_counts(&self, post_ids: &[i64]) -> Result<HashMap<i64, EngagementCounts>> {
        let mut counts: HashMap<i64, EngagementCounts> = HashMap::new();
        if post_ids.is_empty() {
            return Ok(counts);
        }

        let conn = self.pool.get()?;
        let in_list = placeholders(post_ids.len());

        for table in ["likes", "comments", "shares"] {
            let mut stmt = conn.prepare(&format!(
                "SELECT post_id, COUNT(*) FROM {} WHERE post_id IN ({}) GROUP BY post_id",
                table, in_list
            ))?;
            let rows = stmt
                .query_map(params_from_iter(post_ids.iter()), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for (post_id, n) in rows {
                let entry = counts.entry(post_id).or_default();
                match table {
                    "likes" => entry.likes_count = n,
                    "comments" => entry.comments_count = n,
                    _ => entry.shares_count = n,
                }
            }
        }

        Ok(counts)
    }

    /// Delete a post. Likes, comments and shares cascade.
    pub fn delete(&self, post_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id])
            .context("Failed to delete post")?;
        Ok(rows_affected)
    }
}
