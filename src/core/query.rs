//! Query validation and cursor pagination
//!
//! [`retrieve_entities`] is the single read path for listings: it validates
//! limit, order and filters against the entity's declared attributes, then
//! hands a [`QueryPlan`] to the store. Validation failures never reach the
//! store.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::entity::Entity;
use crate::core::error::ApiError;
use crate::core::store::EntityStore;

/// Page-size bounds applied to every listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLimits {
    /// Applied when the request carries no limit
    #[serde(default = "default_page_size")]
    pub default: usize,

    /// Upper clamp bounding response size
    #[serde(default = "max_page_size")]
    pub max: usize,
}

fn default_page_size() -> usize {
    20
}

fn max_page_size() -> usize {
    100
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default: default_page_size(),
            max: max_page_size(),
        }
    }
}

/// An opaque, store-native continuation token.
///
/// The core makes no assumption about the encoding; only the store that
/// issued a cursor can interpret it. Resuming with a returned cursor yields
/// the next page with no duplicated or skipped items under a stable sort
/// (best-effort under eventual consistency of the underlying store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a previously-issued token
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token text, suitable for a query parameter
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sort attribute with direction, parsed from the `order` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: String,
    pub descending: bool,
}

impl OrderSpec {
    /// Parse an order expression: a leading `-` means descending
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: raw.to_string(),
                descending: false,
            },
        }
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

/// Raw listing parameters as they arrive from a request.
///
/// Everything stays text until [`retrieve_entities`] validates it; a
/// malformed limit is a caller error, not a parse-time panic.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub cursor: Option<Cursor>,
    pub order: Option<String>,

    /// Attribute-name-keyed equality filters, in declaration order
    pub filters: IndexMap<String, String>,
}

impl ListQuery {
    /// Build from decoded query-string pairs.
    ///
    /// `limit`, `cursor` and `order` are lifted out; every other key
    /// becomes a filter. Empty values mean "no constraint" and are kept
    /// here but dropped during validation.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "limit" => query.limit = non_empty(value),
                "cursor" => query.cursor = non_empty(value).map(Cursor::new),
                "order" => query.order = non_empty(value),
                _ => {
                    query.filters.insert(key, value);
                }
            }
        }
        query
    }

    /// Set a filter programmatically
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// A validated query, ready for the store to execute
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub limit: usize,
    pub order: OrderSpec,

    /// Equality constraints, ANDed together
    pub filters: Vec<(String, String)>,
    pub cursor: Option<Cursor>,
}

/// One page of results plus the token to fetch the next one.
///
/// `next_cursor` is `None` when the listing is exhausted.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

/// Validate a [`ListQuery`] against the entity's declared attributes and
/// execute it. Read-only; the store sees nothing when validation fails.
pub async fn retrieve_entities<T, S>(
    store: &S,
    query: &ListQuery,
    limits: &PageLimits,
    default_order: &str,
) -> Result<Page<T>, ApiError>
where
    T: Entity,
    S: EntityStore<T> + ?Sized,
{
    let limit = match &query.limit {
        None => limits.default,
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ApiError::InvalidQuery(format!("limit must be a positive integer, got '{raw}'"))
            })?,
    }
    .min(limits.max);

    let known = T::attributes();
    let order = OrderSpec::parse(query.order.as_deref().unwrap_or(default_order));
    if !known.contains(&order.field.as_str()) {
        return Err(ApiError::InvalidQuery(format!(
            "cannot order {} by unknown attribute '{}'",
            T::kind(),
            order.field
        )));
    }

    let mut filters = Vec::new();
    for (field, raw) in &query.filters {
        if raw.is_empty() {
            continue;
        }
        if !known.contains(&field.as_str()) {
            return Err(ApiError::InvalidQuery(format!(
                "cannot filter {} by unknown attribute '{}'",
                T::kind(),
                field
            )));
        }
        filters.push((field.clone(), raw.clone()));
    }

    let plan = QueryPlan {
        limit,
        order,
        filters,
        cursor: query.cursor.clone(),
    };
    Ok(store.execute(&plan).await?)
}
