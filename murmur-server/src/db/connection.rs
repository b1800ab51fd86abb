use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

use super::schema::{DEMO_DATA, SCHEMA, TABLES};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// How long a writer waits for a competing write lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (manager, in_memory) = Self::create_connection_manager(path);
        let manager = manager.with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            // Cascading deletes depend on this; SQLite leaves it off per connection
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        // Every in-memory connection is its own database, so share a single one
        let builder = if in_memory {
            Pool::builder().max_size(1)
        } else {
            Pool::builder()
        };

        let pool = builder
            .build(manager)
            .context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on path
    ///
    /// # Arguments
    /// * `path` - Database file path or ":memory:" for in-memory database
    ///
    /// # Returns
    /// * The manager and whether it targets an in-memory database
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> (SqliteConnectionManager, bool) {
        let path_str = path.as_ref().to_string_lossy();
        let trimmed_path = path_str.trim();

        if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            (SqliteConnectionManager::memory(), true)
        } else {
            (SqliteConnectionManager::file(path), false)
        }
    }

    /// Create an initialized in-memory database (useful for testing)
    pub fn in_memory() -> Result<Self> {
        let db = Self::new(MEMORY_DB_PATH)?;
        db.initialize()?;
        Ok(db)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Seed the database with demo data
    pub fn seed_demo_data(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(DEMO_DATA)
            .context("Failed to seed demo data")?;
        Ok(())
    }

    /// Row counts for every table, in schema order
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        let conn = self.connection()?;
        TABLES
            .iter()
            .map(|table| {
                let count: i64 = conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })
                    .with_context(|| format!("Failed to count rows in {}", table))?;
                Ok((*table, count))
            })
            .collect()
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");

        // Verify tables exist
        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<_>, _>>()
            .expect("Failed to collect tables");

        for table in TABLES {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().expect("Failed to create database");
        let conn = db.connection().expect("Failed to get connection");
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("Failed to read pragma");
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_seed_demo_data() {
        let db = Database::in_memory().expect("Failed to create database");
        db.seed_demo_data().expect("Failed to seed demo data");
        // Seeding twice is harmless
        db.seed_demo_data().expect("Failed to reseed demo data");

        let counts = db.table_counts().expect("Failed to count rows");
        let users = counts.iter().find(|(t, _)| *t == "users").unwrap().1;
        let follows = counts.iter().find(|(t, _)| *t == "followers").unwrap().1;
        assert_eq!(users, 3);
        assert_eq!(follows, 3);
    }

    #[test]
    fn test_memory_database_detection() {
        // Test various memory database path formats
        let memory_paths = [":memory:", " :memory: ", ":MEMORY:", " :Memory: "];

        for path in &memory_paths {
            let db = Database::new(path).expect("Failed to create memory database");
            db.initialize().expect("Failed to initialize schema");
            assert_eq!(db.pool.max_size(), 1);
        }
    }

    #[test]
    fn test_self_follow_rejected_by_schema() {
        let db = Database::in_memory().expect("Failed to create database");
        db.seed_demo_data().expect("Failed to seed demo data");
        let conn = db.connection().expect("Failed to get connection");

        let result = conn.execute(
            "INSERT INTO followers (follower_id, following_id, created_at) VALUES (1, 1, '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
