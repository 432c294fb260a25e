//! GraphQL authentication middleware and context extraction
//!
//! Provides helpers for:
//! - Extracting the caller's user id from HTTP headers
//! - Creating GraphQL request context with the caller and per-request loaders
//! - Standard Axum handler for the GraphQL endpoint

use async_graphql::{Context, Request, Response};
use axum::{extract::Extension, http::HeaderMap, Json};
use uuid::Uuid;

use crate::dataloaders::UserLoader;
use crate::error::ResolverError;
use crate::repository::Repositories;
use crate::schema::AppSchema;

/// Header carrying the user id of an already authenticated caller
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the client issuing the current request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientSession {
    pub user_id: Option<Uuid>,
}

impl ClientSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }
}

/// Extract user_id from x-user-id header
pub fn extract_user_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// Attach the per-request context every resolver expects
pub fn prepare_request(
    request: Request,
    session: ClientSession,
    repositories: &Repositories,
) -> Request {
    request
        .data(session)
        .data(UserLoader::for_users(repositories.users.clone()))
}

/// Standard GraphQL handler with authentication context injection
///
/// # Example
///
/// ```rust,no_run
/// use axum::{Extension, Router, routing::post};
/// use community_graphql::auth::graphql_handler;
/// use community_graphql::repository::{memory::MemoryStore, Repositories};
/// use community_graphql::schema::build_schema;
/// use std::sync::Arc;
///
/// let repositories = Repositories::memory(Arc::new(MemoryStore::new()));
/// let app: Router = Router::new()
///     .route("/graphql", post(graphql_handler))
///     .layer(Extension(build_schema(repositories.clone())))
///     .layer(Extension(repositories));
/// ```
pub async fn graphql_handler(
    Extension(schema): Extension<AppSchema>,
    Extension(repositories): Extension<Repositories>,
    headers: HeaderMap,
    req: Json<Request>,
) -> Json<Response> {
    let session = match extract_user_id(&headers) {
        Some(user_id) => ClientSession::authenticated(user_id),
        None => ClientSession::anonymous(),
    };
    tracing::debug!(user_id = ?session.user_id, "executing graphql request");

    let request = prepare_request(req.0, session, &repositories);
    Json(schema.execute(request).await)
}

/// Get the current session from GraphQL context
pub fn get_session(ctx: &Context<'_>) -> ClientSession {
    ctx.data_opt::<ClientSession>().copied().unwrap_or_default()
}

/// Get the authenticated caller's id, or fail as unauthenticated
pub fn require_user_id(ctx: &Context<'_>) -> Result<Uuid, ResolverError> {
    get_session(ctx).user_id.ok_or(ResolverError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_user_id() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(extract_user_id(&headers), Some(id));
    }

    #[test]
    fn test_extract_user_id_rejects_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_user_id(&headers), None);
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(extract_user_id(&headers), None);
    }
}
