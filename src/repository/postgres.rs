//! PostgreSQL repositories backed by `sqlx`

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    CommentRepository, FundRepository, RepositoryError, RepositoryResult, UserRepository,
    VotePageQuery, VoteRepository,
};
use crate::models::{Comment, Fund, FundPatch, FundWithMembership, User, Vote};

const FUND_COLUMNS: &str = "id, name, is_tax_deductible, organization_id, creator_id, updater_id, created_at, updated_at";

fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::UniqueViolation(
                db_err.constraint().unwrap_or("unknown").to_string(),
            );
        }
    }
    RepositoryError::Database(err)
}

pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, body, creator_id, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> RepositoryResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, role, created_at FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

pub struct PgVoteRepository {
    pool: PgPool,
}

impl PgVoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for PgVoteRepository {
    async fn list_page(&self, query: &VotePageQuery) -> RepositoryResult<Vec<Vote>> {
        let votes = vote_page_query(query)
            .build_query_as::<Vote>()
            .fetch_all(&self.pool)
            .await?;
        Ok(votes)
    }
}

fn vote_page_query(query: &VotePageQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT comment_id, creator_id, type, created_at FROM comment_votes WHERE comment_id = ",
    );
    qb.push_bind(query.comment_id)
        .push(" AND type = ")
        .push_bind(query.vote_type)
        .push(" AND creator_id IS NOT NULL");

    if let Some(cursor) = query.cursor {
        let cmp = if query.is_inversed { " > " } else { " < " };

        // the anchor row must still exist
        qb.push(" AND EXISTS (SELECT 1 FROM comment_votes WHERE created_at = ")
            .push_bind(cursor.created_at)
            .push(" AND creator_id = ")
            .push_bind(cursor.creator_id)
            .push(" AND comment_id = ")
            .push_bind(query.comment_id)
            .push(" AND type = ")
            .push_bind(query.vote_type)
            .push(")");

        qb.push(" AND ((created_at = ")
            .push_bind(cursor.created_at)
            .push(" AND creator_id")
            .push(cmp)
            .push_bind(cursor.creator_id)
            .push(") OR created_at")
            .push(cmp)
            .push_bind(cursor.created_at)
            .push(")");
    }

    if query.is_inversed {
        qb.push(" ORDER BY created_at ASC, creator_id ASC");
    } else {
        qb.push(" ORDER BY created_at DESC, creator_id DESC");
    }
    qb.push(" LIMIT ").push_bind(query.limit as i64);
    qb
}

pub struct PgFundRepository {
    pool: PgPool,
}

impl PgFundRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FundRepository for PgFundRepository {
    async fn find_with_caller_membership(
        &self,
        fund_id: Uuid,
        member_id: Uuid,
    ) -> RepositoryResult<Option<FundWithMembership>> {
        let row = sqlx::query_as::<_, FundWithMembership>(
            "SELECT f.organization_id, m.role AS membership_role \
             FROM funds f \
             LEFT JOIN organization_memberships m \
               ON m.organization_id = f.organization_id AND m.member_id = $2 \
             WHERE f.id = $1",
        )
        .bind(fund_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_conflicting_name(
        &self,
        organization_id: Uuid,
        name: &str,
        excluding_fund_id: Uuid,
    ) -> RepositoryResult<Option<Fund>> {
        let sql = format!(
            "SELECT {FUND_COLUMNS} FROM funds WHERE organization_id = $1 AND name = $2 AND id <> $3 LIMIT 1"
        );
        let fund = sqlx::query_as::<_, Fund>(&sql)
            .bind(organization_id)
            .bind(name)
            .bind(excluding_fund_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(fund)
    }

    async fn update(&self, fund_id: Uuid, patch: &FundPatch) -> RepositoryResult<Option<Fund>> {
        fund_update_query(fund_id, patch)
            .build_query_as::<Fund>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }
}

/// Only the provided fields are assigned; the updater and timestamp always are
fn fund_update_query(fund_id: Uuid, patch: &FundPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE funds SET updater_id = ");
    qb.push_bind(patch.updater_id)
        .push(", updated_at = ")
        .push_bind(patch.updated_at);
    if let Some(name) = &patch.name {
        qb.push(", name = ").push_bind(name.clone());
    }
    if let Some(is_tax_deductible) = patch.is_tax_deductible {
        qb.push(", is_tax_deductible = ").push_bind(is_tax_deductible);
    }
    qb.push(" WHERE id = ")
        .push_bind(fund_id)
        .push(" RETURNING ")
        .push(FUND_COLUMNS);
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrganizationMembershipRole, VoteCursor, VoteType};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap()
    }

    fn page_query(cursor: Option<VoteCursor>, is_inversed: bool) -> VotePageQuery {
        VotePageQuery {
            comment_id: Uuid::new_v4(),
            vote_type: VoteType::UpVote,
            cursor,
            is_inversed,
            limit: 3,
        }
    }

    #[test]
    fn test_first_page_sql() {
        let qb = vote_page_query(&page_query(None, false));
        assert_eq!(
            qb.sql(),
            "SELECT comment_id, creator_id, type, created_at FROM comment_votes \
             WHERE comment_id = $1 AND type = $2 AND creator_id IS NOT NULL \
             ORDER BY created_at DESC, creator_id DESC LIMIT $3"
        );
    }

    #[test]
    fn test_cursor_page_sql_follows_direction() {
        let cursor = VoteCursor {
            created_at: at(1),
            creator_id: Uuid::new_v4(),
        };

        let forward = vote_page_query(&page_query(Some(cursor), false));
        assert!(forward.sql().contains(" AND EXISTS (SELECT 1 FROM comment_votes WHERE created_at = $3 AND creator_id = $4 AND comment_id = $5 AND type = $6)"));
        assert!(forward.sql().contains(" AND ((created_at = $7 AND creator_id < $8) OR created_at < $9)"));
        assert!(forward.sql().ends_with(" ORDER BY created_at DESC, creator_id DESC LIMIT $10"));

        let inverse = vote_page_query(&page_query(Some(cursor), true));
        assert!(inverse.sql().contains(" AND ((created_at = $7 AND creator_id > $8) OR created_at > $9)"));
        assert!(inverse.sql().ends_with(" ORDER BY created_at ASC, creator_id ASC LIMIT $10"));
    }

    #[test]
    fn test_fund_update_sql_sets_only_provided_fields() {
        let patch = FundPatch {
            name: None,
            is_tax_deductible: Some(true),
            updater_id: Uuid::new_v4(),
            updated_at: at(0),
        };
        let qb = fund_update_query(Uuid::new_v4(), &patch);
        assert_eq!(
            qb.sql(),
            format!(
                "UPDATE funds SET updater_id = $1, updated_at = $2, is_tax_deductible = $3 \
                 WHERE id = $4 RETURNING {FUND_COLUMNS}"
            )
        );
    }

    async fn seed_user(pool: &PgPool, name: &str) -> sqlx::Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
        Ok(id)
    }

    async fn seed_comment(pool: &PgPool) -> sqlx::Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO comments (id, body) VALUES ($1, 'hello')")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(id)
    }

    async fn seed_vote(
        pool: &PgPool,
        comment_id: Uuid,
        creator_id: Uuid,
        vote_type: VoteType,
        created_at: DateTime<Utc>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO comment_votes (comment_id, creator_id, type, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(comment_id)
        .bind(creator_id)
        .bind(vote_type)
        .bind(created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn seed_organization(pool: &PgPool) -> sqlx::Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO organizations (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(id.to_string())
            .execute(pool)
            .await?;
        Ok(id)
    }

    async fn seed_fund(pool: &PgPool, organization_id: Uuid, name: &str) -> sqlx::Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO funds (id, name, organization_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(id)
    }

    fn creators(votes: &[Vote]) -> Vec<Uuid> {
        votes.iter().filter_map(|v| v.creator_id).collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires postgres"]
    async fn test_list_page_orders_by_direction(pool: PgPool) -> RepositoryResult<()> {
        let repo = PgVoteRepository::new(pool.clone());
        let comment_id = seed_comment(&pool).await?;
        let mut voters = Vec::new();
        for (second, name) in [(1, "a"), (2, "b"), (3, "c")] {
            let id = seed_user(&pool, name).await?;
            seed_vote(&pool, comment_id, id, VoteType::UpVote, at(second)).await?;
            voters.push(id);
        }
        let down = seed_user(&pool, "down").await?;
        seed_vote(&pool, comment_id, down, VoteType::DownVote, at(9)).await?;

        let mut query = VotePageQuery {
            comment_id,
            vote_type: VoteType::UpVote,
            cursor: None,
            is_inversed: false,
            limit: 10,
        };
        let forward = repo.list_page(&query).await?;
        assert_eq!(creators(&forward), vec![voters[2], voters[1], voters[0]]);

        query.is_inversed = true;
        let inverse = repo.list_page(&query).await?;
        assert_eq!(creators(&inverse), vec![voters[0], voters[1], voters[2]]);

        query.cursor = Some(VoteCursor {
            created_at: at(2),
            creator_id: voters[1],
        });
        assert_eq!(creators(&repo.list_page(&query).await?), vec![voters[2]]);

        query.is_inversed = false;
        query.limit = 1;
        assert_eq!(creators(&repo.list_page(&query).await?), vec![voters[0]]);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires postgres"]
    async fn test_list_page_breaks_ties_on_creator(pool: PgPool) -> RepositoryResult<()> {
        let repo = PgVoteRepository::new(pool.clone());
        let comment_id = seed_comment(&pool).await?;
        let mut voters = Vec::new();
        for name in ["a", "b", "c"] {
            let id = seed_user(&pool, name).await?;
            seed_vote(&pool, comment_id, id, VoteType::UpVote, at(7)).await?;
            voters.push(id);
        }
        voters.sort();

        let query = VotePageQuery {
            comment_id,
            vote_type: VoteType::UpVote,
            cursor: Some(VoteCursor {
                created_at: at(7),
                creator_id: voters[2],
            }),
            is_inversed: false,
            limit: 10,
        };
        let page = repo.list_page(&query).await?;
        assert_eq!(creators(&page), vec![voters[1], voters[0]]);
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires postgres"]
    async fn test_list_page_with_stale_cursor_is_empty(pool: PgPool) -> RepositoryResult<()> {
        let repo = PgVoteRepository::new(pool.clone());
        let comment_id = seed_comment(&pool).await?;
        let kept = seed_user(&pool, "a").await?;
        seed_vote(&pool, comment_id, kept, VoteType::UpVote, at(1)).await?;
        let gone = seed_user(&pool, "b").await?;
        seed_vote(&pool, comment_id, gone, VoteType::UpVote, at(2)).await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(gone)
            .execute(&pool)
            .await?;

        let mut query = VotePageQuery {
            comment_id,
            vote_type: VoteType::UpVote,
            cursor: None,
            is_inversed: false,
            limit: 10,
        };
        assert_eq!(creators(&repo.list_page(&query).await?), vec![kept]);

        query.cursor = Some(VoteCursor {
            created_at: at(2),
            creator_id: gone,
        });
        assert!(repo.list_page(&query).await?.is_empty());
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires postgres"]
    async fn test_update_assigns_only_provided_fields(pool: PgPool) -> RepositoryResult<()> {
        let repo = PgFundRepository::new(pool.clone());
        let organization_id = seed_organization(&pool).await?;
        let fund_id = seed_fund(&pool, organization_id, "General").await?;
        let updater_id = seed_user(&pool, "dee").await?;

        let patch = FundPatch {
            name: None,
            is_tax_deductible: Some(true),
            updater_id,
            updated_at: at(5),
        };
        let fund = repo.update(fund_id, &patch).await?.expect("fund exists");
        assert_eq!(fund.name, "General");
        assert!(fund.is_tax_deductible);
        assert_eq!(fund.updater_id, Some(updater_id));
        assert_eq!(fund.updated_at, Some(at(5)));

        assert!(repo.update(Uuid::new_v4(), &patch).await?.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires postgres"]
    async fn test_update_to_taken_name_is_unique_violation(pool: PgPool) -> RepositoryResult<()> {
        let repo = PgFundRepository::new(pool.clone());
        let organization_id = seed_organization(&pool).await?;
        seed_fund(&pool, organization_id, "General").await?;
        let building = seed_fund(&pool, organization_id, "Building").await?;
        let updater_id = seed_user(&pool, "dee").await?;

        assert!(repo
            .find_conflicting_name(organization_id, "General", building)
            .await?
            .is_some());

        let patch = FundPatch {
            name: Some("General".to_string()),
            is_tax_deductible: None,
            updater_id,
            updated_at: at(5),
        };
        let err = repo.update(building, &patch).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::UniqueViolation(ref constraint) if constraint == "funds_organization_id_name_key"
        ));
        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires postgres"]
    async fn test_caller_membership_is_optional(pool: PgPool) -> RepositoryResult<()> {
        let repo = PgFundRepository::new(pool.clone());
        let organization_id = seed_organization(&pool).await?;
        let fund_id = seed_fund(&pool, organization_id, "General").await?;
        let member = seed_user(&pool, "dee").await?;
        let outsider = seed_user(&pool, "eve").await?;
        sqlx::query(
            "INSERT INTO organization_memberships (organization_id, member_id, role) VALUES ($1, $2, $3)",
        )
        .bind(organization_id)
        .bind(member)
        .bind(OrganizationMembershipRole::Administrator)
        .execute(&pool)
        .await?;

        let found = repo.find_with_caller_membership(fund_id, member).await?;
        assert_eq!(
            found,
            Some(FundWithMembership {
                organization_id,
                membership_role: Some(OrganizationMembershipRole::Administrator),
            })
        );
        let found = repo.find_with_caller_membership(fund_id, outsider).await?;
        assert_eq!(found.and_then(|f| f.membership_role), None);
        assert!(repo
            .find_with_caller_membership(Uuid::new_v4(), member)
            .await?
            .is_none());
        Ok(())
    }
}
