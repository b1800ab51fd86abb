mod user_repository;
mod post_repository;
mod like_repository;
mod comment_repository;
mod share_repository;
mod follow_repository;

pub use user_repository::UserRepository;
pub use post_repository::{NewPost, PostRepository, FEED_LIMIT};
pub use like_repository::{LikeRepository, LikeTarget};
pub use comment_repository::{CommentRepository, COMMENT_LIST_LIMIT};
pub use share_repository::{ShareRepository, SHARE_LIST_LIMIT};
pub use follow_repository::{FollowOutcome, FollowRepository, SUGGESTION_LIMIT};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{types::Type, Connection, Row};

/// Current time at the precision stored in the database
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC3339 text, so timestamp columns sort chronologically
pub(crate) fn db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Read an RFC3339 timestamp column
pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Check whether a row with the given id exists in `table`
pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table),
        [id],
        |row| row.get(0),
    )
}

/// `?, ?, ?` placeholder list for an `IN (...)` clause
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
