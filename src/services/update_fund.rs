//! `updateFund` mutation

use async_graphql::{InputObject, ID};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::ClientSession;
use crate::error::{ArgumentIssue, ResolverError};
use crate::models::{Fund, FundPatch, OrganizationMembershipRole, UserRole};
use crate::repository::{RepositoryError, Repositories};
use crate::validation::Issues;

#[derive(InputObject, Validate, Debug, Clone)]
pub struct MutationUpdateFundInput {
    /// Global identifier of the fund
    pub id: ID,
    #[validate(length(
        min = 1,
        max = 256,
        message = "Must be between 1 and 256 characters long."
    ))]
    pub name: Option<String>,
    pub is_tax_deductible: Option<bool>,
}

/// Input that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
struct UpdateFundArguments {
    id: Uuid,
    name: Option<String>,
    is_tax_deductible: Option<bool>,
}

impl MutationUpdateFundInput {
    fn parse(&self) -> Result<UpdateFundArguments, ResolverError> {
        let mut issues = Issues::new();
        issues.validate(&["input"], self);

        let id = Uuid::parse_str(self.id.as_str()).ok();
        if id.is_none() {
            issues.push(ArgumentIssue::new(["input", "id"], "Must be a valid UUID."));
        }
        if self.name.is_none() && self.is_tax_deductible.is_none() {
            issues.push(ArgumentIssue::new(
                ["input"],
                r#"At least one optional argument within the "input" argument must be a defined value."#,
            ));
        }

        match id {
            Some(id) => issues.finish(UpdateFundArguments {
                id,
                name: self.name.clone(),
                is_tax_deductible: self.is_tax_deductible,
            }),
            None => Err(ResolverError::InvalidArguments {
                issues: issues.into_vec(),
            }),
        }
    }
}

fn name_unavailable() -> ResolverError {
    ResolverError::ForbiddenActionOnArgumentsAssociatedResources {
        issues: vec![ArgumentIssue::new(
            ["input", "name"],
            "This name is not available.",
        )],
    }
}

/// Update the supplied fields of a fund on behalf of `session`
///
/// Allowed for global administrators and for administrators of the fund's
/// organization. A name must stay unique within the organization.
#[tracing::instrument(skip_all, fields(fund_id = input.id.as_str()))]
pub async fn update_fund(
    repositories: &Repositories,
    session: ClientSession,
    input: &MutationUpdateFundInput,
) -> Result<Fund, ResolverError> {
    let caller_id = session.user_id.ok_or(ResolverError::Unauthenticated)?;
    let args = input.parse()?;

    let (current_user, fund) = tokio::try_join!(
        repositories.users.find_by_id(caller_id),
        repositories
            .funds
            .find_with_caller_membership(args.id, caller_id),
    )?;

    let Some(current_user) = current_user else {
        tracing::warn!(%caller_id, "session refers to an unknown user");
        return Err(ResolverError::Unauthenticated);
    };

    let Some(fund) = fund else {
        return Err(ResolverError::ArgumentsAssociatedResourcesNotFound {
            issues: vec![ArgumentIssue::at(["input", "id"])],
        });
    };

    if let Some(name) = &args.name {
        let conflict = repositories
            .funds
            .find_conflicting_name(fund.organization_id, name, args.id)
            .await?;
        if conflict.is_some() {
            return Err(name_unavailable());
        }
    }

    let is_authorized = current_user.role == UserRole::Administrator
        || fund.membership_role == Some(OrganizationMembershipRole::Administrator);
    if !is_authorized {
        return Err(
            ResolverError::UnauthorizedActionOnArgumentsAssociatedResources {
                issues: vec![ArgumentIssue::at(["input", "id"])],
            },
        );
    }

    let patch = FundPatch {
        name: args.name,
        is_tax_deductible: args.is_tax_deductible,
        updater_id: caller_id,
        updated_at: Utc::now(),
    };

    match repositories.funds.update(args.id, &patch).await {
        Ok(Some(updated)) => {
            tracing::info!(organization_id = %updated.organization_id, "fund updated");
            Ok(updated)
        }
        Ok(None) => {
            tracing::error!("fund vanished between lookup and update");
            Err(ResolverError::Unexpected)
        }
        Err(RepositoryError::UniqueViolation(constraint)) => {
            tracing::warn!(%constraint, "fund name claimed concurrently");
            Err(name_unavailable())
        }
        Err(err) => Err(err.into()),
    }
}
