//! GraphQL object types and root fields

use async_graphql::Context;

use crate::dataloaders::UserLoader;
use crate::error::ResolverError;
use crate::repository::Repositories;

mod comment;
mod fund;
mod mutation;
mod query;
mod user;

pub use mutation::Mutation;
pub use query::Query;

fn repositories<'a>(ctx: &Context<'a>) -> Result<&'a Repositories, ResolverError> {
    Ok(ctx.data::<Repositories>()?)
}

fn user_loader<'a>(ctx: &Context<'a>) -> Result<&'a UserLoader, ResolverError> {
    Ok(ctx.data::<UserLoader>()?)
}
