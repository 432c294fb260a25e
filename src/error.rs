//! Error payloads returned by the resolvers
//!
//! Every failure a client can observe carries a machine-readable `code`
//! extension. Argument-related codes additionally carry the list of
//! offending argument paths under `issues`.

use async_graphql::{ErrorExtensions, Value};
use serde::Serialize;
use thiserror::Error;

use crate::repository::RepositoryError;

/// One problem with one argument of the operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentIssue {
    pub argument_path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ArgumentIssue {
    pub fn new<I, S>(argument_path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argument_path: argument_path.into_iter().map(Into::into).collect(),
            message: Some(message.into()),
        }
    }

    /// Issue pointing at an argument without further explanation
    pub fn at<I, S>(argument_path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argument_path: argument_path.into_iter().map(Into::into).collect(),
            message: None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("You must be authenticated to perform this action.")]
    Unauthenticated,

    #[error("You have provided invalid arguments for this action.")]
    InvalidArguments { issues: Vec<ArgumentIssue> },

    #[error("No associated resources found for the provided arguments.")]
    ArgumentsAssociatedResourcesNotFound { issues: Vec<ArgumentIssue> },

    #[error("This action is forbidden on the resources associated to the provided arguments.")]
    ForbiddenActionOnArgumentsAssociatedResources { issues: Vec<ArgumentIssue> },

    #[error("You are not authorized to perform this action on the resources associated to the provided arguments.")]
    UnauthorizedActionOnArgumentsAssociatedResources { issues: Vec<ArgumentIssue> },

    #[error("Something went wrong. Please try again later.")]
    Unexpected,
}

impl ResolverError {
    pub fn code(&self) -> &'static str {
        match self {
            ResolverError::Unauthenticated => "unauthenticated",
            ResolverError::InvalidArguments { .. } => "invalid_arguments",
            ResolverError::ArgumentsAssociatedResourcesNotFound { .. } => {
                "arguments_associated_resources_not_found"
            }
            ResolverError::ForbiddenActionOnArgumentsAssociatedResources { .. } => {
                "forbidden_action_on_arguments_associated_resources"
            }
            ResolverError::UnauthorizedActionOnArgumentsAssociatedResources { .. } => {
                "unauthorized_action_on_arguments_associated_resources"
            }
            ResolverError::Unexpected => "unexpected",
        }
    }

    pub fn issues(&self) -> Option<&[ArgumentIssue]> {
        match self {
            ResolverError::InvalidArguments { issues }
            | ResolverError::ArgumentsAssociatedResourcesNotFound { issues }
            | ResolverError::ForbiddenActionOnArgumentsAssociatedResources { issues }
            | ResolverError::UnauthorizedActionOnArgumentsAssociatedResources { issues } => {
                Some(issues)
            }
            ResolverError::Unauthenticated | ResolverError::Unexpected => None,
        }
    }
}

impl ErrorExtensions for ResolverError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, extensions| {
            extensions.set("code", Value::String(self.code().to_string()));
            if let Some(issues) = self.issues() {
                extensions.set(
                    "issues",
                    async_graphql::to_value(issues).unwrap_or(Value::Null),
                );
            }
        })
    }
}

impl From<RepositoryError> for ResolverError {
    fn from(err: RepositoryError) -> Self {
        tracing::error!(error = %err, "storage operation failed");
        ResolverError::Unexpected
    }
}

impl From<async_graphql::Error> for ResolverError {
    fn from(err: async_graphql::Error) -> Self {
        tracing::error!(error = %err.message, "request context is incomplete");
        ResolverError::Unexpected
    }
}
