//! Relay-style cursor pagination

use async_graphql::{Object, SimpleObject};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::error::ArgumentIssue;
use crate::validation::Issues;

/// URL-safe alphabet, unpadded on encode, padding tolerated on decode
const CURSOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Page information
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// Edge in a connection
#[derive(Debug, Clone)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[Object]
impl<T: async_graphql::OutputType> Edge<T> {
    async fn cursor(&self) -> &str {
        &self.cursor
    }

    async fn node(&self) -> &T {
        &self.node
    }
}

/// Connection (paginated result)
#[derive(Debug, Clone)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

#[Object]
impl<T: async_graphql::OutputType> Connection<T> {
    async fn edges(&self) -> &[Edge<T>] {
        &self.edges
    }

    async fn page_info(&self) -> &PageInfo {
        &self.page_info
    }
}

impl<T> Connection<T> {
    /// Build a connection from one page of rows
    ///
    /// `raw_nodes` must already be trimmed with
    /// [`ParsedConnectionArguments::split_extra_row`], which also yields
    /// `has_more`. Inverse fetches arrive in reverse order and are flipped
    /// back here.
    pub fn from_raw_nodes<R, C>(
        parsed: &ParsedConnectionArguments<C>,
        mut raw_nodes: Vec<R>,
        has_more: bool,
        create_cursor: impl Fn(&R) -> String,
        create_node: impl Fn(R) -> T,
    ) -> Self {
        let mut page_info = PageInfo::default();

        if parsed.is_inversed {
            raw_nodes.reverse();
            page_info.has_previous_page = has_more;
            page_info.has_next_page = parsed.cursor.is_some();
        } else {
            page_info.has_next_page = has_more;
            page_info.has_previous_page = parsed.cursor.is_some();
        }

        let edges: Vec<Edge<T>> = raw_nodes
            .into_iter()
            .map(|raw| Edge {
                cursor: create_cursor(&raw),
                node: create_node(raw),
            })
            .collect();

        page_info.start_cursor = edges.first().map(|e| e.cursor.clone());
        page_info.end_cursor = edges.last().map(|e| e.cursor.clone());

        Self { edges, page_info }
    }
}

/// Cursor encoding/decoding
pub struct CursorCodec;

impl CursorCodec {
    /// Encode structured cursor (e.g., timestamp + ID)
    pub fn encode_structured<T: Serialize>(value: &T) -> crate::Result<String> {
        let json = serde_json::to_string(value)
            .map_err(|e| crate::GraphQLError::InvalidCursor(e.to_string()))?;
        Ok(CURSOR_ENGINE.encode(json.as_bytes()))
    }

    /// Decode structured cursor
    pub fn decode_structured<T: DeserializeOwned>(cursor: &str) -> crate::Result<T> {
        let bytes = CURSOR_ENGINE
            .decode(cursor.as_bytes())
            .map_err(|e| crate::GraphQLError::InvalidCursor(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| crate::GraphQLError::InvalidCursor(e.to_string()))
    }
}

/// Raw connection field arguments
///
/// Follows the Relay Cursor Connections Specification:
/// https://relay.dev/graphql/connections.htm
#[derive(Validate, Debug, Clone, Default)]
pub struct ConnectionArguments {
    /// Number of items to return (forward pagination)
    #[validate(range(
        min = 1,
        max = 32,
        message = "Must be an integer between 1 and 32."
    ))]
    pub first: Option<i32>,

    /// Cursor to start from (forward pagination)
    pub after: Option<String>,

    /// Number of items to return (backward pagination)
    #[validate(range(
        min = 1,
        max = 32,
        message = "Must be an integer between 1 and 32."
    ))]
    pub last: Option<i32>,

    /// Cursor to start from (backward pagination)
    pub before: Option<String>,
}

/// Connection arguments reduced to a single traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConnectionArguments<C> {
    pub cursor: Option<C>,
    /// Traversing with `last`/`before`
    pub is_inversed: bool,
    /// Rows to fetch: the page size plus one
    pub limit: usize,
}

impl<C> ParsedConnectionArguments<C> {
    /// Drop the look-ahead row from a fetch of `limit` rows
    ///
    /// Returns whether another page exists in the direction of travel. Must
    /// run on the rows as fetched, before any of them are filtered out.
    pub fn split_extra_row<R>(&self, rows: &mut Vec<R>) -> bool {
        let has_more = rows.len() >= self.limit;
        rows.truncate(self.limit.saturating_sub(1));
        has_more
    }
}

impl ConnectionArguments {
    pub fn forward(first: i32, after: Option<String>) -> Self {
        Self {
            first: Some(first),
            after,
            ..Self::default()
        }
    }

    pub fn backward(last: i32, before: Option<String>) -> Self {
        Self {
            last: Some(last),
            before,
            ..Self::default()
        }
    }

    /// Normalize into [`ParsedConnectionArguments`], decoding the cursor as `C`
    ///
    /// Every problem is recorded; nothing stops at the first issue.
    pub fn parse<C: DeserializeOwned>(
        &self,
    ) -> Result<ParsedConnectionArguments<C>, Vec<ArgumentIssue>> {
        let mut issues = Issues::new();
        issues.validate(&[], self);

        let (page_size, raw_cursor, is_inversed) = match (self.first, self.last) {
            (Some(first), last) => {
                if last.is_some() {
                    issues.push(ArgumentIssue::new(
                        ["last"],
                        r#"Argument must not be provided if argument "first" is provided."#,
                    ));
                }
                if self.before.is_some() {
                    issues.push(ArgumentIssue::new(
                        ["before"],
                        r#"Argument must not be provided if argument "first" is provided."#,
                    ));
                }
                (first, self.after.as_deref(), false)
            }
            (None, Some(last)) => {
                if self.after.is_some() {
                    issues.push(ArgumentIssue::new(
                        ["after"],
                        r#"Argument must not be provided if argument "last" is provided."#,
                    ));
                }
                (last, self.before.as_deref(), true)
            }
            (None, None) => {
                issues.push(ArgumentIssue::new(
                    ["first"],
                    r#"A non-null value for argument "first" must be provided."#,
                ));
                issues.push(ArgumentIssue::new(
                    ["last"],
                    r#"A non-null value for argument "last" must be provided."#,
                ));
                return Err(issues.into_vec());
            }
        };

        let cursor = match raw_cursor {
            Some(raw) => match CursorCodec::decode_structured::<C>(raw) {
                Ok(cursor) => Some(cursor),
                Err(_) => {
                    issues.push(ArgumentIssue::new(
                        [cursor_argument(is_inversed)],
                        "Not a valid cursor.",
                    ));
                    None
                }
            },
            None => None,
        };

        if !issues.is_empty() {
            return Err(issues.into_vec());
        }

        Ok(ParsedConnectionArguments {
            cursor,
            is_inversed,
            limit: page_size as usize + 1,
        })
    }
}

/// Name of the argument that carries the cursor for a traversal direction
pub fn cursor_argument(is_inversed: bool) -> &'static str {
    if is_inversed {
        "before"
    } else {
        "after"
    }
}
