//! Relational query layer
//!
//! Resolvers only see these traits. [`postgres`] backs them with `sqlx`,
//! [`memory`] with in-process maps for local runs and tests.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Comment, Fund, FundPatch, FundWithMembership, User, Vote, VoteCursor, VoteType};

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A write collided with a uniqueness constraint
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Keyset page request over the votes of one comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotePageQuery {
    pub comment_id: Uuid,
    pub vote_type: VoteType,
    /// Only rows strictly past this position in the traversal order
    pub cursor: Option<VoteCursor>,
    /// Ascending order when set, descending otherwise
    pub is_inversed: bool,
    pub limit: usize,
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Comment>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    /// Users for the given ids; unknown ids are absent from the result
    async fn find_by_ids(&self, ids: &[Uuid]) -> RepositoryResult<Vec<User>>;
}

#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Votes with a non-null creator, ordered by `(created_at, creator_id)`
    ///
    /// With a cursor, an empty page is also returned when the cursor's own
    /// vote no longer exists.
    async fn list_page(&self, query: &VotePageQuery) -> RepositoryResult<Vec<Vote>>;
}

#[async_trait]
pub trait FundRepository: Send + Sync {
    /// The fund's organization together with `member_id`'s membership role in it
    async fn find_with_caller_membership(
        &self,
        fund_id: Uuid,
        member_id: Uuid,
    ) -> RepositoryResult<Option<FundWithMembership>>;

    /// Another fund of `organization_id` already named `name`
    async fn find_conflicting_name(
        &self,
        organization_id: Uuid,
        name: &str,
        excluding_fund_id: Uuid,
    ) -> RepositoryResult<Option<Fund>>;

    /// Apply `patch`; `None` when no fund with `fund_id` exists anymore
    async fn update(&self, fund_id: Uuid, patch: &FundPatch) -> RepositoryResult<Option<Fund>>;
}

/// Handles to every repository, shared by all requests
#[derive(Clone)]
pub struct Repositories {
    pub comments: Arc<dyn CommentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub funds: Arc<dyn FundRepository>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            comments: Arc::new(postgres::PgCommentRepository::new(pool.clone())),
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            votes: Arc::new(postgres::PgVoteRepository::new(pool.clone())),
            funds: Arc::new(postgres::PgFundRepository::new(pool)),
        }
    }

    pub fn memory(store: Arc<memory::MemoryStore>) -> Self {
        Self {
            comments: store.clone(),
            users: store.clone(),
            votes: store.clone(),
            funds: store,
        }
    }
}
