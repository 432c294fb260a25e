use async_graphql::{Context, ErrorExtensions, InputObject, Object, ID};
use uuid::Uuid;

use super::repositories;
use crate::error::{ArgumentIssue, ResolverError};
use crate::models::Comment;

#[derive(InputObject)]
pub struct QueryCommentInput {
    pub id: ID,
}

pub struct Query;

#[Object]
impl Query {
    /// Fetch a single comment
    async fn comment(
        &self,
        ctx: &Context<'_>,
        input: QueryCommentInput,
    ) -> async_graphql::Result<Comment> {
        find_comment(ctx, &input).await.map_err(|e| e.extend())
    }
}

async fn find_comment(
    ctx: &Context<'_>,
    input: &QueryCommentInput,
) -> Result<Comment, ResolverError> {
    let id = Uuid::parse_str(input.id.as_str()).map_err(|_| ResolverError::InvalidArguments {
        issues: vec![ArgumentIssue::new(["input", "id"], "Must be a valid UUID.")],
    })?;

    repositories(ctx)?
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ResolverError::ArgumentsAssociatedResourcesNotFound {
            issues: vec![ArgumentIssue::at(["input", "id"])],
        })
}
