use anyhow::{Context, Result};
use rusqlite::{Connection, TransactionBehavior};

use murmur_types::{LikeAction, LikeStatus, LikeToggle};

use super::{db_timestamp, now, row_exists};
use crate::db::{DbPool, StoreError, StoreResult};

/// What a like points at. Post likes and comment likes share one
/// toggle implementation over different tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post,
    Comment,
}

impl LikeTarget {
    fn table(&self) -> &'static str {
        match self {
            LikeTarget::Post => "likes",
            LikeTarget::Comment => "comment_likes",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            LikeTarget::Post => "post_id",
            LikeTarget::Comment => "comment_id",
        }
    }

    fn parent_table(&self) -> &'static str {
        match self {
            LikeTarget::Post => "posts",
            LikeTarget::Comment => "comments",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LikeTarget::Post => "Post",
            LikeTarget::Comment => "Comment",
        }
    }
}

fn count_likes(conn: &Connection, target: LikeTarget, target_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            target.table(),
            target.column()
        ),
        [target_id],
        |row| row.get(0),
    )
}

pub struct LikeRepository {
    pool: DbPool,
    target: LikeTarget,
}

impl LikeRepository {
    pub fn new(pool: DbPool, target: LikeTarget) -> Self {
        Self { pool, target }
    }

    pub fn for_posts(pool: DbPool) -> Self {
        Self::new(pool, LikeTarget::Post)
    }

    pub fn for_comments(pool: DbPool) -> Self {
        Self::new(pool, LikeTarget::Comment)
    }

    /// Flip the user's like on a target and return the new total.
    ///
    /// Runs in one transaction: an existing edge is removed, otherwise one
    /// is inserted. The count is taken after the change inside the same
    /// transaction.
    pub fn toggle(&self, user_id: i64, target_id: i64) -> StoreResult<LikeToggle> {
        let target = self.target;
        let mut conn = self.pool.get()?;
        // Take the write lock up front; a deferred transaction that upgrades
        // from a read lock fails with SQLITE_BUSY instead of waiting
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !row_exists(&tx, target.parent_table(), target_id)? {
            return Err(StoreError::NotFound(format!("{} not found", target.label())));
        }

        let removed = tx
            .execute(
                &format!(
                    "DELETE FROM {} WHERE user_id = ? AND {} = ?",
                    target.table(),
                    target.column()
                ),
                (user_id, target_id),
            )
            .context("Failed to remove like")?;

        let action = if removed > 0 {
            LikeAction::Unliked
        } else {
            tx.execute(
                &format!(
                    "INSERT INTO {} (user_id, {}, created_at) VALUES (?, ?, ?)
                     ON CONFLICT DO NOTHING",
                    target.table(),
                    target.column()
                ),
                (user_id, target_id, db_timestamp(&now())),
            )
            .context("Failed to add like")?;
            LikeAction::Liked
        };

        let count = count_likes(&tx, target, target_id)?;
        tx.commit().context("Failed to commit like toggle")?;

        tracing::debug!(
            user_id,
            target_id,
            kind = target.label(),
            action = action.as_str(),
            count,
            "Toggled like"
        );

        Ok(LikeToggle { action, count })
    }

    /// Number of likes on a target
    pub fn count_for(&self, target_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        Ok(count_likes(&conn, self.target, target_id)?)
    }

    /// Whether the user currently likes the target
    pub fn has_liked(&self, user_id: i64, target_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let liked: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ? AND {} = ?)",
                self.target.table(),
                self.target.column()
            ),
            (user_id, target_id),
            |row| row.get(0),
        )?;
        Ok(liked)
    }

    /// Count plus whether the viewer (if any) likes the target
    pub fn status(&self, target_id: i64, viewer_id: Option<i64>) -> Result<LikeStatus> {
        let count = self.count_for(target_id)?;
        let is_liked = match viewer_id {
            Some(user_id) => self.has_liked(user_id, target_id)?,
            None => false,
        };
        Ok(LikeStatus { count, is_liked })
    }
}
