//! Executable schema

use async_graphql::{EmptySubscription, Schema};

use crate::repository::Repositories;
use crate::resolvers::{Mutation, Query};

pub type AppSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn build_schema(repositories: Repositories) -> AppSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(repositories)
        .finish()
}
