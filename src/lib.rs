//! # community-graphql
//!
//! GraphQL resolvers for a community and organization management service.
//!
//! ## Features
//!
//! - **Cursor Pagination** - Relay-style keyset pagination over comment votes
//! - **Fund Mutations** - role-checked partial updates with per-organization name uniqueness
//! - **Structured Errors** - machine-readable codes and per-argument issues
//! - **DataLoader** - Batch loading for N+1 prevention
//! - **Auth Middleware** - caller extraction for the GraphQL handler
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use community_graphql::repository::{memory::MemoryStore, Repositories};
//! use community_graphql::schema::build_schema;
//!
//! let repositories = Repositories::memory(Arc::new(MemoryStore::new()));
//! let schema = build_schema(repositories);
//! ```

pub mod auth;
pub mod config;
pub mod dataloaders;
pub mod error;
pub mod logging;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod resolvers;
pub mod schema;
pub mod services;
pub mod types;
pub mod validation;

pub use auth::{extract_user_id, graphql_handler, ClientSession};
pub use dataloaders::{BatchLoader, DataLoader, UserLoader};
pub use error::{ArgumentIssue, ResolverError};
pub use pagination::{Connection, ConnectionArguments, CursorCodec, Edge, PageInfo};
pub use schema::{build_schema, AppSchema};
pub use types::DateTime;

use thiserror::Error;

/// GraphQL errors
#[derive(Error, Debug)]
pub enum GraphQLError {
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
}

/// Result type for GraphQL operations
pub type Result<T> = std::result::Result<T, GraphQLError>;
