use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};

use murmur_types::{Principal, User, UserRole};

use super::{db_timestamp, now, timestamp_column};
use crate::db::DbPool;

const USER_COLUMNS: &str = "id, external_id, name, email, image, role, created_at, updated_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let email: Option<String> = row.get(3)?;
    let role: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        email: email.unwrap_or_default(),
        image: row.get(4)?,
        role: UserRole::parse(&role).unwrap_or_default(),
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

fn select_by_external_id(conn: &Connection, external_id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE external_id = ?", USER_COLUMNS),
        [external_id],
        map_user,
    )
    .optional()
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get user by local ID
    pub fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [user_id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by the id assigned by the external identity provider
    pub fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        Ok(select_by_external_id(&conn, external_id)?)
    }

    /// Check if a user exists
    pub fn exists(&self, user_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        Ok(super::row_exists(&conn, "users", user_id)?)
    }

    /// Return the user for a principal, creating the row on first sight.
    ///
    /// The insert ignores uniqueness conflicts and the row is re-read, so
    /// concurrent first requests for one principal converge on a single user.
    pub fn find_or_create(&self, principal: &Principal) -> Result<User> {
        let conn = self.pool.get()?;

        if let Some(existing) = select_by_external_id(&conn, &principal.external_id)? {
            return Ok(existing);
        }

        let now = db_timestamp(&now());
        let email = principal.primary_email();
        let inserted = conn
            .execute(
                "INSERT INTO users (external_id, name, email, image, role, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT DO NOTHING",
                (
                    &principal.external_id,
                    principal.display_name(),
                    // Empty addresses are stored as NULL so they never collide
                    (!email.is_empty()).then_some(email),
                    principal.image_url.as_deref(),
                    UserRole::default().as_str(),
                    &now,
                    &now,
                ),
            )
            .context("Failed to create user")?;

        if inserted > 0 {
            tracing::info!(external_id = %principal.external_id, "Created local user for new principal");
        }

        select_by_external_id(&conn, &principal.external_id)?.ok_or_else(|| {
            anyhow!(
                "Principal {} conflicts with an existing user (email already registered)",
                principal.external_id
            )
        })
    }

    /// Delete a user. Posts, engagement rows and follow edges cascade.
    pub fn delete(&self, user_id: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows_affected = conn
            .execute("DELETE FROM users WHERE id = ?", [user_id])
            .context("Failed to delete user")?;
        Ok(rows_affected)
    }
}
