//! Persistent entities and the values exchanged with the repositories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(async_graphql::Enum, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[graphql(rename_items = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Administrator,
    Regular,
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "organization_membership_role", rename_all = "snake_case")]
pub enum OrganizationMembershipRole {
    Administrator,
    Regular,
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "comment_vote_type", rename_all = "snake_case")]
pub enum VoteType {
    DownVote,
    UpVote,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub body: String,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One user's vote on one comment; at most one per (creator, comment)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Vote {
    pub comment_id: Uuid,
    pub creator_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

/// Position of a vote within the `(created_at, creator_id)` ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCursor {
    pub created_at: DateTime<Utc>,
    pub creator_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Fund {
    pub id: Uuid,
    pub name: String,
    pub is_tax_deductible: bool,
    pub organization_id: Uuid,
    pub creator_id: Option<Uuid>,
    pub updater_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A fund's owning organization and the caller's role within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct FundWithMembership {
    pub organization_id: Uuid,
    pub membership_role: Option<OrganizationMembershipRole>,
}

/// Column changes applied by a fund update; `None` leaves a column untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundPatch {
    pub name: Option<String>,
    pub is_tax_deductible: Option<bool>,
    pub updater_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OrganizationMembership {
    pub organization_id: Uuid,
    pub member_id: Uuid,
    pub role: OrganizationMembershipRole,
}
