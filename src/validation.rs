//! Argument validation with per-field issue collection
//!
//! Field constraints are declared with `validator` derives; cross-field rules
//! are pushed onto the same [`Issues`] collector so a single pass reports
//! every offending argument.

use heck::ToLowerCamelCase;
use validator::{Validate, ValidationErrors};

use crate::error::{ArgumentIssue, ResolverError};

/// Accumulates argument issues until the whole input has been inspected
#[derive(Debug, Default)]
pub struct Issues {
    issues: Vec<ArgumentIssue>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ArgumentIssue) {
        self.issues.push(issue);
    }

    /// Run the derived constraints of `value`, recording failures under `prefix`
    pub fn validate<T: Validate>(&mut self, prefix: &[&str], value: &T) {
        if let Err(errors) = value.validate() {
            self.issues.extend(flatten(prefix, &errors));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(value)` when nothing was recorded, the invalid-arguments error otherwise
    pub fn finish<T>(self, value: T) -> Result<T, ResolverError> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ResolverError::InvalidArguments {
                issues: self.issues,
            })
        }
    }

    pub fn into_vec(self) -> Vec<ArgumentIssue> {
        self.issues
    }
}

fn flatten(prefix: &[&str], errors: &ValidationErrors) -> Vec<ArgumentIssue> {
    let mut issues: Vec<ArgumentIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |error| {
                let mut path: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
                if field != "__all__" {
                    path.push(field.to_lower_camel_case());
                }
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Failed the \"{}\" constraint.", error.code));
                ArgumentIssue {
                    argument_path: path,
                    message: Some(message),
                }
            })
        })
        .collect();

    // field_errors is unordered
    issues.sort_by(|a, b| a.argument_path.cmp(&b.argument_path));
    issues
}
