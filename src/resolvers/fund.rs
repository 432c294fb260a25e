use async_graphql::{Context, ErrorExtensions, Object, ID};

use super::user_loader;
use crate::error::ResolverError;
use crate::models::{Fund, User};
use crate::types::DateTime;

#[Object]
impl Fund {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.name
    }

    async fn is_tax_deductible(&self) -> bool {
        self.is_tax_deductible
    }

    async fn created_at(&self) -> DateTime {
        self.created_at.into()
    }

    async fn updated_at(&self) -> Option<DateTime> {
        self.updated_at.map(DateTime)
    }

    /// User who last updated the fund
    async fn updater(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<User>> {
        let Some(updater_id) = self.updater_id else {
            return Ok(None);
        };
        let loader = user_loader(ctx).map_err(|e| e.extend())?;
        loader
            .load(updater_id)
            .await
            .map_err(|e| ResolverError::from(e).extend())
    }
}
