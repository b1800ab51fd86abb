use anyhow::{Context, Result};
use rusqlite::Row;

use murmur_types::Share;

use super::{db_timestamp, now, row_exists, timestamp_column};
use crate::db::{DbPool, StoreError, StoreResult};

/// Maximum number of shares returned for one post
pub const SHARE_LIST_LIMIT: i64 = 200;

fn map_share(row: &Row<'_>) -> rusqlite::Result<Share> {
    Ok(Share {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        caption: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}

pub struct ShareRepository {
    pool: DbPool,
}

impl ShareRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record a share. Sharing the same post again adds another row.
    pub fn create(&self, user_id: i64, post_id: i64, caption: Option<&str>) -> StoreResult<Share> {
        let conn = self.pool.get()?;
        if !row_exists(&conn, "posts", post_id)? {
            return Err(StoreError::NotFound("Post not found".to_string()));
        }

        let caption = caption
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let created_at = now();

        conn.execute(
            "INSERT INTO shares (user_id, post_id, caption, created_at) VALUES (?, ?, ?, ?)",
            (user_id, post_id, &caption, db_timestamp(&created_at)),
        )
        .context("Failed to create share")?;

        Ok(Share {
            id: conn.last_insert_rowid(),
            user_id,
            post_id,
            caption,
            created_at,
        })
    }

    /// Shares of a post in the order they were made
    pub fn list_for_post(&self, post_id: i64, limit: i64) -> Result<Vec<Share>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, post_id, caption, created_at
             FROM shares
             WHERE post_id = ?
             ORDER BY id ASC
             LIMIT ?",
        )?;

        let shares = stmt
            .query_map((post_id, limit), map_share)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{create_post, create_user, setup_db};

    #[test]
    fn test_repeated_shares_accumulate() {
        let (_db, pool) = setup_db();
        let u1 = create_user(&pool, "ext_1", "Ada");
        let u2 = create_user(&pool, "ext_2", "Grace");
        let post_id = create_post(&pool, u1.id, "hello");
        let repo = ShareRepository::new(pool);

        let first = repo.create(u2.id, post_id, Some("  look  ")).unwrap();
        assert_eq!(first.caption.as_deref(), Some("look"));
        let second = repo.create(u2.id, post_id, Some("   ")).unwrap();
        assert_eq!(second.caption, None);

        let listed = repo.list_for_post(post_id, SHARE_LIST_LIMIT).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], first);
        assert_eq!(listed[1].id, second.id);
    }

    #[test]
    fn test_share_missing_post_is_not_found() {
        let (_db, pool) = setup_db();
        let user = create_user(&pool, "ext_1", "Ada");
        let repo = ShareRepository::new(pool);

        assert!(matches!(
            repo.create(user.id, 404, None),
            Err(StoreError::NotFound(_))
        ));
        assert!(repo.list_for_post(404, SHARE_LIST_LIMIT).unwrap().is_empty());
    }
}
