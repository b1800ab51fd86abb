use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use murmur_types::{Comment, CommentAuthor, UNKNOWN_NAME};

use super::{db_timestamp, now, row_exists, timestamp_column};
use crate::db::{DbPool, StoreError, StoreResult};

/// Maximum number of comments returned for one post
pub const COMMENT_LIST_LIMIT: i64 = 200;

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.user_id, c.content, c.parent_comment_id,
        c.created_at, c.updated_at, u.id, u.name, u.image,
        (SELECT COUNT(*) FROM comment_likes cl WHERE cl.comment_id = c.id)
 FROM comments c
 LEFT JOIN users u ON c.user_id = u.id";

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let author_name: Option<String> = row.get(8)?;
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        parent_comment_id: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
        author: CommentAuthor {
            id: row.get(7)?,
            name: author_name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            avatar: row.get(9)?,
        },
        likes_count: row.get(10)?,
    })
}

fn select_comment(conn: &Connection, comment_id: i64) -> rusqlite::Result<Option<Comment>> {
    conn.query_row(
        &format!("{} WHERE c.id = ?", COMMENT_SELECT),
        [comment_id],
        map_comment,
    )
    .optional()
}

/// Reject blank text; what is stored is exactly what was sent
fn require_content(content: &str) -> StoreResult<&str> {
    if content.trim().is_empty() {
        return Err(StoreError::InvalidArgument("Content is required".to_string()));
    }
    Ok(content)
}

/// Load a comment and check that `editor_id` wrote it
fn owned_comment(conn: &Connection, comment_id: i64, editor_id: i64) -> StoreResult<Comment> {
    let comment = select_comment(conn, comment_id)?
        .ok_or_else(|| StoreError::NotFound("Comment not found".to_string()))?;
    if comment.user_id != editor_id {
        return Err(StoreError::Forbidden(
            "Not authorized to modify this comment".to_string(),
        ));
    }
    Ok(comment)
}

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a comment, optionally as a reply to another comment on the same post
    pub fn create(
        &self,
        author_id: i64,
        post_id: i64,
        content: &str,
        parent_comment_id: Option<i64>,
    ) -> StoreResult<Comment> {
        let content = require_content(content)?;
        let conn = self.pool.get()?;

        if !row_exists(&conn, "posts", post_id)? {
            return Err(StoreError::NotFound("Post not found".to_string()));
        }

        if let Some(parent_id) = parent_comment_id {
            let parent_post: Option<i64> = conn
                .query_row("SELECT post_id FROM comments WHERE id = ?", [parent_id], |row| {
                    row.get(0)
                })
                .optional()?;
            match parent_post {
                None => return Err(StoreError::NotFound("Parent comment not found".to_string())),
                Some(id) if id != post_id => {
                    return Err(StoreError::InvalidArgument(
                        "Parent comment belongs to a different post".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }

        let now = db_timestamp(&now());
        conn.execute(
            "INSERT INTO comments (user_id, post_id, content, parent_comment_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (author_id, post_id, content, parent_comment_id, &now, &now),
        )
        .context("Failed to create comment")?;

        let comment_id = conn.last_insert_rowid();
        select_comment(&conn, comment_id)?
            .ok_or_else(|| StoreError::NotFound("Comment not found".to_string()))
    }

    /// Get a single comment with author and like count
    pub fn get(&self, comment_id: i64) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        Ok(select_comment(&conn, comment_id)?)
    }

    /// Comments on a post in the order they were written
    pub fn list_for_post(&self, post_id: i64, limit: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE c.post_id = ? ORDER BY c.id ASC LIMIT ?",
            COMMENT_SELECT
        ))?;

        let comments = stmt
            .query_map((post_id, limit), map_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    /// Replace a comment's text. Only its author may do this.
    pub fn update(&self, comment_id: i64, editor_id: i64, content: &str) -> StoreResult<Comment> {
        let conn = self.pool.get()?;
        let content = require_content(content)?;
        owned_comment(&conn, comment_id, editor_id)?;

        conn.execute(
            "UPDATE comments SET content = ?, updated_at = ? WHERE id = ?",
            (content, db_timestamp(&now()), comment_id),
        )
        .context("Failed to update comment")?;

        select_comment(&conn, comment_id)?
            .ok_or_else(|| StoreError::NotFound("Comment not found".to_string()))
    }

    /// Delete a comment and return it as it was. Only its author may do this.
    ///
    /// Its likes cascade; replies stay and lose their parent link.
    pub fn delete(&self, comment_id: i64, editor_id: i64) -> StoreResult<Comment> {
        let conn = self.pool.get()?;
        let comment = owned_comment(&conn, comment_id, editor_id)?;

        conn.execute("DELETE FROM comments WHERE id = ?", [comment_id])
            .context("Failed to delete comment")?;

        Ok(comment)
    }
}
