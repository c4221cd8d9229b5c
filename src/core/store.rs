//! Store trait abstracting the document store
//!
//! The application layer never caches entities beyond one request (the
//! settings singleton excepted) and never locks; writes rely on the
//! store's atomic single-entity write guarantee. Retry policy, if any,
//! belongs to the store client behind this trait.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::core::entity::Entity;
use crate::core::error::ApiError;
use crate::core::field::FieldValue;
use crate::core::query::{Page, QueryPlan};

/// Errors produced by storage backends
#[derive(Debug, Error)]
pub enum StoreError {
    /// A continuation token that this store did not issue, or that no
    /// longer decodes
    #[error("corrupt continuation token")]
    BadCursor,

    /// Backend failure (connection, lock, IO)
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BadCursor => ApiError::InvalidQuery("malformed cursor".to_string()),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

/// Document-store operations for one entity type
///
/// `put` stamps the entity's `modified` timestamp; it is the single write
/// primitive, atomic per entity. `execute` runs a validated [`QueryPlan`]
/// and is the only operation that touches more than one entity.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Load one entity by id
    async fn get(&self, id: &Uuid) -> Result<Option<T>, StoreError>;

    /// Create or replace one entity, stamping its modified timestamp
    async fn put(&self, entity: T) -> Result<T, StoreError>;

    /// Find the first entity whose attribute equals the given value
    async fn find_one(&self, field: &str, value: &FieldValue) -> Result<Option<T>, StoreError>;

    /// Execute a validated query plan, returning one page and an opaque
    /// continuation token when more results may exist
    async fn execute(&self, plan: &QueryPlan) -> Result<Page<T>, StoreError>;
}
