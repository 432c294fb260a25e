use async_graphql::{Object, ID};

use crate::models::{User, UserRole};
use crate::types::DateTime;

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.name
    }

    async fn role(&self) -> UserRole {
        self.role
    }

    async fn created_at(&self) -> DateTime {
        self.created_at.into()
    }
}
