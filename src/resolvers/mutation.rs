use async_graphql::{Context, ErrorExtensions, Object};

use super::repositories;
use crate::auth::get_session;
use crate::models::Fund;
use crate::services::{update_fund, MutationUpdateFundInput};

pub struct Mutation;

#[Object]
impl Mutation {
    /// Update a fund's name and/or tax-deductible flag
    async fn update_fund(
        &self,
        ctx: &Context<'_>,
        input: MutationUpdateFundInput,
    ) -> async_graphql::Result<Fund> {
        let repositories = repositories(ctx).map_err(|e| e.extend())?;
        update_fund(repositories, get_session(ctx), &input)
            .await
            .map_err(|e| e.extend())
    }
}
