//! In-process repositories

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CommentRepository, FundRepository, RepositoryError, RepositoryResult, UserRepository,
    VotePageQuery, VoteRepository,
};
use crate::models::{
    Comment, Fund, FundPatch, FundWithMembership, OrganizationMembership, User, Vote,
};

/// Every table held in memory, mirroring the relational schema
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
    votes: RwLock<Vec<Vote>>,
    funds: RwLock<HashMap<Uuid, Fund>>,
    memberships: RwLock<Vec<OrganizationMembership>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    /// Delete a user the way the foreign keys do
    ///
    /// Authored votes, comments and funds keep their rows with the reference
    /// nulled out; memberships are deleted with the user.
    pub async fn remove_user(&self, id: Uuid) -> Option<User> {
        let removed = self.users.write().await.remove(&id)?;

        for vote in self.votes.write().await.iter_mut() {
            if vote.creator_id == Some(id) {
                vote.creator_id = None;
            }
        }
        for comment in self.comments.write().await.values_mut() {
            if comment.creator_id == Some(id) {
                comment.creator_id = None;
            }
        }
        for fund in self.funds.write().await.values_mut() {
            if fund.creator_id == Some(id) {
                fund.creator_id = None;
            }
            if fund.updater_id == Some(id) {
                fund.updater_id = None;
            }
        }
        self.memberships.write().await.retain(|m| m.member_id != id);

        Some(removed)
    }

    /// Delete only the user row, leaving votes that still point at it
    ///
    /// Reproduces a user vanishing between the vote fetch and the voter
    /// lookup.
    #[cfg(test)]
    pub(crate) async fn remove_user_keeping_votes(&self, id: Uuid) -> Option<User> {
        self.users.write().await.remove(&id)
    }

    pub async fn insert_comment(&self, comment: Comment) {
        self.comments.write().await.insert(comment.id, comment);
    }

    /// Replaces an existing vote of the same creator on the same comment
    pub async fn insert_vote(&self, vote: Vote) {
        let mut votes = self.votes.write().await;
        votes.retain(|v| {
            !(v.comment_id == vote.comment_id
                && v.creator_id.is_some()
                && v.creator_id == vote.creator_id)
        });
        votes.push(vote);
    }

    pub async fn insert_fund(&self, fund: Fund) -> RepositoryResult<()> {
        let mut funds = self.funds.write().await;
        if name_taken(&funds, fund.organization_id, &fund.name, fund.id) {
            return Err(RepositoryError::UniqueViolation(
                "funds_organization_id_name_key".to_string(),
            ));
        }
        funds.insert(fund.id, fund);
        Ok(())
    }

    pub async fn remove_fund(&self, id: Uuid) -> Option<Fund> {
        self.funds.write().await.remove(&id)
    }

    pub async fn fund(&self, id: Uuid) -> Option<Fund> {
        self.funds.read().await.get(&id).cloned()
    }

    pub async fn insert_membership(&self, membership: OrganizationMembership) {
        let mut memberships = self.memberships.write().await;
        memberships.retain(|m| {
            !(m.organization_id == membership.organization_id
                && m.member_id == membership.member_id)
        });
        memberships.push(membership);
    }
}

fn name_taken(funds: &HashMap<Uuid, Fund>, organization_id: Uuid, name: &str, excluding: Uuid) -> bool {
    funds
        .values()
        .any(|f| f.id != excluding && f.organization_id == organization_id && f.name == name)
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Comment>> {
        Ok(self.comments.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> RepositoryResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl VoteRepository for MemoryStore {
    async fn list_page(&self, query: &VotePageQuery) -> RepositoryResult<Vec<Vote>> {
        let votes = self.votes.read().await;
        let in_scope = |v: &&Vote| {
            v.comment_id == query.comment_id
                && v.vote_type == query.vote_type
                && v.creator_id.is_some()
        };

        if let Some(cursor) = query.cursor {
            let anchor_exists = votes.iter().filter(in_scope).any(|v| {
                v.created_at == cursor.created_at && v.creator_id == Some(cursor.creator_id)
            });
            if !anchor_exists {
                return Ok(Vec::new());
            }
        }

        let mut page: Vec<Vote> = votes
            .iter()
            .filter(in_scope)
            .filter(|v| match (query.cursor, v.creator_id) {
                (Some(cursor), Some(creator_id)) => {
                    let key = (v.created_at, creator_id);
                    let anchor = (cursor.created_at, cursor.creator_id);
                    if query.is_inversed {
                        key > anchor
                    } else {
                        key < anchor
                    }
                }
                _ => true,
            })
            .cloned()
            .collect();

        page.sort_by(|a, b| (a.created_at, a.creator_id).cmp(&(b.created_at, b.creator_id)));
        if !query.is_inversed {
            page.reverse();
        }
        page.truncate(query.limit);
        Ok(page)
    }
}

#[async_trait]
impl FundRepository for MemoryStore {
    async fn find_with_caller_membership(
        &self,
        fund_id: Uuid,
        member_id: Uuid,
    ) -> RepositoryResult<Option<FundWithMembership>> {
        let Some(organization_id) = self
            .funds
            .read()
            .await
            .get(&fund_id)
            .map(|f| f.organization_id)
        else {
            return Ok(None);
        };

        let membership_role = self
            .memberships
            .read()
            .await
            .iter()
            .find(|m| m.organization_id == organization_id && m.member_id == member_id)
            .map(|m| m.role);

        Ok(Some(FundWithMembership {
            organization_id,
            membership_role,
        }))
    }

    async fn find_conflicting_name(
        &self,
        organization_id: Uuid,
        name: &str,
        excluding_fund_id: Uuid,
    ) -> RepositoryResult<Option<Fund>> {
        Ok(self
            .funds
            .read()
            .await
            .values()
            .find(|f| {
                f.id != excluding_fund_id && f.organization_id == organization_id && f.name == name
            })
            .cloned())
    }

    async fn update(&self, fund_id: Uuid, patch: &FundPatch) -> RepositoryResult<Option<Fund>> {
        let mut funds = self.funds.write().await;
        let Some(current) = funds.get(&fund_id).cloned() else {
            return Ok(None);
        };

        if let Some(name) = &patch.name {
            if name_taken(&funds, current.organization_id, name, fund_id) {
                return Err(RepositoryError::UniqueViolation(
                    "funds_organization_id_name_key".to_string(),
                ));
            }
        }

        let mut updated = current;
        if let Some(name) = &patch.name {
            updated.name = name.clone();
        }
        if let Some(is_tax_deductible) = patch.is_tax_deductible {
            updated.is_tax_deductible = is_tax_deductible;
        }
        updated.updater_id = Some(patch.updater_id);
        updated.updated_at = Some(patch.updated_at);

        funds.insert(fund_id, updated.clone());
        Ok(Some(updated))
    }
}
