//! Users who voted on a comment, as a keyset-paginated connection

use uuid::Uuid;

use crate::dataloaders::UserLoader;
use crate::error::{ArgumentIssue, ResolverError};
use crate::models::{User, VoteCursor, VoteType};
use crate::pagination::{cursor_argument, Connection, ConnectionArguments, CursorCodec};
use crate::repository::{VotePageQuery, VoteRepository};

/// Resolve the voters of `comment_id` that voted in `vote_type` direction
///
/// Forward pages run newest first on `(created_at, creator_id)`, inverse
/// pages oldest first. A cursor that yields no rows is an error, while an
/// empty first page is not. Votes whose creator no longer resolves to a
/// user are skipped.
#[tracing::instrument(skip(votes, users, args))]
pub async fn resolve_voters(
    votes: &dyn VoteRepository,
    users: &UserLoader,
    comment_id: Uuid,
    vote_type: VoteType,
    args: &ConnectionArguments,
) -> Result<Connection<User>, ResolverError> {
    let parsed = args
        .parse::<VoteCursor>()
        .map_err(|issues| ResolverError::InvalidArguments { issues })?;

    let query = VotePageQuery {
        comment_id,
        vote_type,
        cursor: parsed.cursor,
        is_inversed: parsed.is_inversed,
        limit: parsed.limit,
    };
    let mut page = votes.list_page(&query).await?;

    if parsed.cursor.is_some() && page.is_empty() {
        return Err(ResolverError::ArgumentsAssociatedResourcesNotFound {
            issues: vec![ArgumentIssue::at([cursor_argument(parsed.is_inversed)])],
        });
    }

    let has_more = parsed.split_extra_row(&mut page);

    let creator_ids: Vec<Uuid> = page.iter().filter_map(|v| v.creator_id).collect();
    let voters = users.load_many(creator_ids).await?;

    let fetched = page.len();
    let raw_nodes = page
        .into_iter()
        .filter_map(|vote| {
            let creator_id = vote.creator_id?;
            let voter = voters.get(&creator_id)?.clone();
            let cursor = VoteCursor {
                created_at: vote.created_at,
                creator_id,
            };
            Some(CursorCodec::encode_structured(&cursor).map(|cursor| (cursor, voter)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            tracing::error!(error = %err, "failed to encode vote cursor");
            ResolverError::Unexpected
        })?;

    if raw_nodes.len() < fetched {
        tracing::debug!(
            dropped = fetched - raw_nodes.len(),
            "skipping votes without a resolvable voter"
        );
    }

    Ok(Connection::from_raw_nodes(
        &parsed,
        raw_nodes,
        has_more,
        |(cursor, _)| cursor.clone(),
        |(_, voter)| voter,
    ))
}
