use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use murmur_types::{FollowEdge, FollowSuggestion};

use super::{db_timestamp, now, row_exists, timestamp_column};
use crate::db::{DbPool, StoreError, StoreResult};

/// Default number of follow suggestions
pub const SUGGESTION_LIMIT: i64 = 10;

/// Result of a follow request
#[derive(Debug, Clone, PartialEq)]
pub enum FollowOutcome {
    Created(FollowEdge),
    AlreadyFollowing,
}

fn count_edges(conn: &Connection, column: &str, user_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM followers WHERE {} = ?", column),
        [user_id],
        |row| row.get(0),
    )
}

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Follow a user
    pub fn follow(&self, follower_id: i64, following_id: i64) -> StoreResult<FollowOutcome> {
        if follower_id == following_id {
            return Err(StoreError::InvalidArgument("Cannot follow yourself".to_string()));
        }

        let conn = self.pool.get()?;
        if !row_exists(&conn, "users", following_id)? {
            return Err(StoreError::NotFound("Target user not found".to_string()));
        }

        let created_at = now();
        let inserted = conn
            .execute(
                "INSERT INTO followers (follower_id, following_id, created_at) VALUES (?, ?, ?)
                 ON CONFLICT DO NOTHING",
                (follower_id, following_id, db_timestamp(&created_at)),
            )
            .context("Failed to follow user")?;

        if inserted == 0 {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        tracing::debug!(follower_id, following_id, "Created follow edge");

        Ok(FollowOutcome::Created(FollowEdge {
            id: conn.last_insert_rowid(),
            follower_id,
            following_id,
            created_at,
        }))
    }

    /// Unfollow a user
    pub fn unfollow(&self, follower_id: i64, following_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM followers WHERE follower_id = ? AND following_id = ?",
                (follower_id, following_id),
            )
            .context("Failed to unfollow user")?;
        Ok(rows_affected)
    }

    /// Check if user A is following user B
    pub fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let edge: Option<i64> = conn
            .query_row(
                "SELECT id FROM followers WHERE follower_id = ? AND following_id = ?",
                (follower_id, following_id),
                |row| row.get(0),
            )
            .optional()?;
        Ok(edge.is_some())
    }

    /// Number of users following this user
    pub fn follower_count(&self, user_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        Ok(count_edges(&conn, "following_id", user_id)?)
    }

    /// Number of users this user follows
    pub fn following_count(&self, user_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        Ok(count_edges(&conn, "follower_id", user_id)?)
    }

    /// Edges pointing at this user, most recent first
    pub fn followers_of(&self, user_id: i64) -> Result<Vec<FollowEdge>> {
        self.edges_where("following_id", user_id)
    }

    /// Edges leaving this user, most recent first
    pub fn following_of(&self, user_id: i64) -> Result<Vec<FollowEdge>> {
        self.edges_where("follower_id", user_id)
    }

    fn edges_where(&self, column: &str, user_id: i64) -> Result<Vec<FollowEdge>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, follower_id, following_id, created_at
             FROM followers
             WHERE {} = ?
             ORDER BY created_at DESC, id DESC",
            column
        ))?;

        let edges = stmt
            .query_map([user_id], |row| {
                Ok(FollowEdge {
                    id: row.get(0)?,
                    follower_id: row.get(1)?,
                    following_id: row.get(2)?,
                    created_at: timestamp_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// Users other than `viewer_id` with their follower totals and whether
    /// the viewer already follows them.
    ///
    /// Follower totals come from one grouped subquery joined onto the
    /// candidate rows, so the cost does not grow with `limit`.
    pub fn suggest(&self, viewer_id: i64, limit: i64) -> Result<Vec<FollowSuggestion>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.name, u.image, COALESCE(fc.total, 0), f.id IS NOT NULL
             FROM users u
             LEFT JOIN (
                 SELECT following_id, COUNT(*) AS total
                 FROM followers
                 GROUP BY following_id
             ) fc ON fc.following_id = u.id
             LEFT JOIN followers f ON f.follower_id = ?1 AND f.following_id = u.id
             WHERE u.id <> ?1
             ORDER BY u.id ASC
             LIMIT ?2",
        )?;

        let suggestions = stmt
            .query_map((viewer_id, limit), |row| {
                Ok(FollowSuggestion {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    image: row.get(2)?,
                    follower_count: row.get(3)?,
                    is_following: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{create_post, create_user, setup_db};
    use crate::db::repositories::{
        CommentRepository, LikeRepository, ShareRepository, UserRepository,
    };
    use proptest::prelude::*;

    #[test]
    fn test_follow_and_unfollow() {
        let (_db, pool) = setup_db();
        let u1 = create_user(&pool, "ext_1", "Ada");
        let u2 = create_user(&pool, "ext_2", "Grace");
        let repo = FollowRepository::new(pool);

        let edge = match repo.follow(u1.id, u2.id).unwrap() {
            FollowOutcome::Created(edge) => edge,
            other => panic!("expected new edge, got {:?}", other),
        };
        assert_eq!(edge.follower_id, u1.id);
        assert_eq!(edge.following_id, u2.id);

        assert!(repo.is_following(u1.id, u2.id).unwrap());
        assert!(!repo.is_following(u2.id, u1.id).unwrap());
        assert_eq!(repo.follower_count(u2.id).unwrap(), 1);
        assert_eq!(repo.following_count(u1.id).unwrap(), 1);
        assert_eq!(repo.followers_of(u2.id).unwrap(), vec![edge.clone()]);
        assert_eq!(repo.following_of(u1.id).unwrap(), vec![edge]);

        assert_eq!(repo.unfollow(u1.id, u2.id).unwrap(), 1);
        assert_eq!(repo.unfollow(u1.id, u2.id).unwrap(), 0);
        assert_eq!(repo.follower_count(u2.id).unwrap(), 0);
    }

    #[test]
    fn test_follow_rejects_self_and_missing_target() {
        let (_db, pool) = setup_db();
        let user = create_user(&pool, "ext_1", "Ada");
        let repo = FollowRepository::new(pool);

        assert!(matches!(
            repo.follow(user.id, user.id),
            Err(StoreError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.follow(user.id, 999),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_suggestions_exclude_viewer() {
        let (_db, pool) = setup_db();
        let u1 = create_user(&pool, "ext_1", "Ada");
        let u2 = create_user(&pool, "ext_2", "Grace");
        let u3 = create_user(&pool, "ext_3", "Linus");
        let repo = FollowRepository::new(pool);

        repo.follow(u1.id, u2.id).unwrap();
        repo.follow(u3.id, u2.id).unwrap();

        let suggestions = repo.suggest(u1.id, SUGGESTION_LIMIT).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|s| s.id != u1.id));

        let grace = suggestions.iter().find(|s| s.id == u2.id).unwrap();
        assert_eq!(grace.follower_count, 2);
        assert!(grace.is_following);

        let linus = suggestions.iter().find(|s| s.id == u3.id).unwrap();
        assert_eq!(linus.follower_count, 0);
        assert!(!linus.is_following);

        assert_eq!(repo.suggest(u1.id, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_deleting_user_cascades_everywhere() {
        let (db, pool) = setup_db();
        let u1 = create_user(&pool, "ext_1", "Ada");
        let u2 = create_user(&pool, "ext_2", "Grace");
        let post_id = create_post(&pool, u1.id, "hello");

        LikeRepository::for_posts(pool.clone()).toggle(u2.id, post_id).unwrap();
        let comment = CommentRepository::new(pool.clone())
            .create(u2.id, post_id, "hi", None)
            .unwrap();
        LikeRepository::for_comments(pool.clone())
            .toggle(u1.id, comment.id)
            .unwrap();
        ShareRepository::new(pool.clone()).create(u2.id, post_id, None).unwrap();
        let follows = FollowRepository::new(pool.clone());
        follows.follow(u1.id, u2.id).unwrap();
        follows.follow(u2.id, u1.id).unwrap();

        assert_eq!(UserRepository::new(pool).delete(u1.id).unwrap(), 1);

        for (table, count) in db.table_counts().unwrap() {
            let expected = if table == "users" { 1 } else { 0 };
            assert_eq!(count, expected, "unexpected rows left in {}", table);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Repeated follows never create more than one edge
        #[test]
        fn prop_follow_is_idempotent(attempts in 1usize..6) {
            let (_db, pool) = setup_db();
            let u1 = create_user(&pool, "ext_1", "Ada");
            let u2 = create_user(&pool, "ext_2", "Grace");
            let repo = FollowRepository::new(pool);

            let mut created = 0;
            for _ in 0..attempts {
                if let FollowOutcome::Created(_) = repo.follow(u1.id, u2.id).unwrap() {
                    created += 1;
                }
            }

            prop_assert_eq!(created, 1);
            prop_assert_eq!(repo.follower_count(u2.id).unwrap(), 1);
        }
    }
}
