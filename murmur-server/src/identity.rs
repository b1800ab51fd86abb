use axum::http::HeaderMap;

use murmur_types::{Principal, User};

use crate::db::repositories::UserRepository;
use crate::db::DbPool;

/// Header carrying the external principal id
pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_FIRST_NAME_HEADER: &str = "x-principal-first-name";
pub const PRINCIPAL_LAST_NAME_HEADER: &str = "x-principal-last-name";
pub const PRINCIPAL_EMAIL_HEADER: &str = "x-principal-email";
pub const PRINCIPAL_IMAGE_URL_HEADER: &str = "x-principal-image-url";

/// Source of the externally authenticated principal for a request
pub trait IdentityProvider: Send + Sync {
    /// The principal behind the request, or `None` for anonymous callers
    fn current_principal(&self, headers: &HeaderMap) -> Option<Principal>;
}

/// Trusts principal headers set by an authenticating gateway in front of
/// the server. Requests without a principal id are anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIdentityProvider;

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl IdentityProvider for HeaderIdentityProvider {
    fn current_principal(&self, headers: &HeaderMap) -> Option<Principal> {
        let external_id = header_value(headers, PRINCIPAL_ID_HEADER)?;
        Some(Principal {
            external_id,
            first_name: header_value(headers, PRINCIPAL_FIRST_NAME_HEADER),
            last_name: header_value(headers, PRINCIPAL_LAST_NAME_HEADER),
            email: header_value(headers, PRINCIPAL_EMAIL_HEADER),
            image_url: header_value(headers, PRINCIPAL_IMAGE_URL_HEADER),
        })
    }
}

/// Maps principals onto local users, creating them on first sight
pub struct IdentityResolver {
    users: UserRepository,
}

impl IdentityResolver {
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Local user for the principal. Store failures are logged and treated
    /// as an unauthenticated request.
    pub fn resolve_or_create(&self, principal: &Principal) -> Option<User> {
        match self.users.find_or_create(principal) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(
                    external_id = %principal.external_id,
                    "Failed to resolve principal: {:#}",
                    e
                );
                None
            }
        }
    }
}
