use axum::http::HeaderMap;
use std::sync::Arc;

use murmur_types::User;

use crate::db::Database;
use crate::identity::{IdentityProvider, IdentityResolver};
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub object_store: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(
        db: Database,
        identity: Arc<dyn IdentityProvider>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            db,
            identity,
            object_store,
        }
    }

    /// Local user behind the request, created on first sight.
    /// `None` for anonymous requests and for principals that cannot be resolved.
    pub fn current_user(&self, headers: &HeaderMap) -> Option<User> {
        let principal = self.identity.current_principal(headers)?;
        IdentityResolver::new(self.db.pool.clone()).resolve_or_create(&principal)
    }
}
