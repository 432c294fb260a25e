use async_graphql::{Context, ErrorExtensions, Object, ID};

use super::{repositories, user_loader};
use crate::error::ResolverError;
use crate::models::{Comment, User, VoteType};
use crate::pagination::{Connection, ConnectionArguments};
use crate::services::resolve_voters;
use crate::types::DateTime;

impl Comment {
    async fn voters(
        &self,
        ctx: &Context<'_>,
        vote_type: VoteType,
        args: ConnectionArguments,
    ) -> Result<Connection<User>, ResolverError> {
        let repositories = repositories(ctx)?;
        let loader = user_loader(ctx)?;
        resolve_voters(repositories.votes.as_ref(), loader, self.id, vote_type, &args).await
    }
}

#[Object]
impl Comment {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn body(&self) -> &str {
        &self.body
    }

    async fn created_at(&self) -> DateTime {
        self.created_at.into()
    }

    /// Users who up-voted this comment, newest vote first
    async fn up_voters(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> async_graphql::Result<Connection<User>> {
        let args = ConnectionArguments {
            first,
            after,
            last,
            before,
        };
        self.voters(ctx, VoteType::UpVote, args)
            .await
            .map_err(|e| e.extend())
    }

    /// Users who down-voted this comment, newest vote first
    async fn down_voters(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> async_graphql::Result<Connection<User>> {
        let args = ConnectionArguments {
            first,
            after,
            last,
            before,
        };
        self.voters(ctx, VoteType::DownVote, args)
            .await
            .map_err(|e| e.extend())
    }
}
