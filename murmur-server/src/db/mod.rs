pub mod schema;
pub mod connection;
pub mod error;
pub mod repositories;

pub use connection::{Database, DbConnection, DbPool};
pub use error::{StoreError, StoreResult};
