//! In-memory implementation of EntityStore for testing and development
//!
//! Uses RwLock for thread-safe access. Continuation tokens are keyset
//! cursors: the base64 payload records the sort key and id of the last
//! item served, so resuming never duplicates or skips items under a
//! stable sort, even when the query is re-executed later.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::core::entity::Entity;
use crate::core::field::json_compare;
use crate::core::query::{Cursor, Page, QueryPlan};
use crate::core::store::{EntityStore, StoreError};

/// In-memory entity store
#[derive(Clone)]
pub struct InMemoryStore<T: Entity> {
    rows: Arc<RwLock<HashMap<Uuid, T>>>,
}

/// What a continuation token decodes to.
///
/// The order expression is embedded so a token replayed against a
/// different ordering is rejected instead of silently misbehaving.
#[derive(Debug, Serialize, Deserialize)]
struct CursorPayload {
    o: String,
    k: Value,
    id: Uuid,
}

impl<T: Entity> InMemoryStore<T> {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    /// Whether the store holds no entities
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn encode_cursor(plan: &QueryPlan, key: &Value, id: Uuid) -> Result<Cursor, StoreError> {
        let payload = CursorPayload {
            o: plan.order.to_string(),
            k: key.clone(),
            id,
        };
        let bytes =
            serde_json::to_vec(&payload).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Cursor::new(URL_SAFE_NO_PAD.encode(bytes)))
    }

    fn decode_cursor(plan: &QueryPlan, cursor: &Cursor) -> Result<(Value, Uuid), StoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(cursor.as_str())
            .map_err(|_| StoreError::BadCursor)?;
        let payload: CursorPayload =
            serde_json::from_slice(&bytes).map_err(|_| StoreError::BadCursor)?;
        if payload.o != plan.order.to_string() {
            return Err(StoreError::BadCursor);
        }
        Ok((payload.k, payload.id))
    }

    fn sort_key(entity: &T, field: &str) -> Value {
        entity
            .field_value(field)
            .map(|v| v.to_json())
            .unwrap_or(Value::Null)
    }
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Total order over (sort key, id) pairs; flipped wholesale when the
/// order is descending so "after the cursor" keeps one meaning.
fn position_cmp(a: &(Value, Uuid), b: &(Value, Uuid), descending: bool) -> Ordering {
    let forward = json_compare(&a.0, &b.0).then_with(|| a.1.cmp(&b.1));
    if descending { forward.reverse() } else { forward }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    async fn get(&self, id: &Uuid) -> Result<Option<T>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Backend(format!("failed to acquire read lock: {e}")))?;
        Ok(rows.get(id).cloned())
    }

    async fn put(&self, mut entity: T) -> Result<T, StoreError> {
        entity.touch();
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Backend(format!("failed to acquire write lock: {e}")))?;
        rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn find_one(
        &self,
        field: &str,
        value: &crate::core::field::FieldValue,
    ) -> Result<Option<T>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Backend(format!("failed to acquire read lock: {e}")))?;
        Ok(rows
            .values()
            .find(|entity| entity.field_value(field).as_ref() == Some(value))
            .cloned())
    }

    async fn execute(&self, plan: &QueryPlan) -> Result<Page<T>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Backend(format!("failed to acquire read lock: {e}")))?;

        let mut matched: Vec<(Value, Uuid, T)> = rows
            .values()
            .filter(|entity| {
                plan.filters.iter().all(|(field, raw)| {
                    entity
                        .field_value(field)
                        .is_some_and(|v| v.equals_text(raw))
                })
            })
            .map(|entity| {
                (
                    Self::sort_key(entity, &plan.order.field),
                    entity.id(),
                    entity.clone(),
                )
            })
            .collect();
        drop(rows);

        matched.sort_by(|a, b| {
            position_cmp(
                &(a.0.clone(), a.1),
                &(b.0.clone(), b.1),
                plan.order.descending,
            )
        });

        let start = match &plan.cursor {
            None => 0,
            Some(cursor) => {
                let after = Self::decode_cursor(plan, cursor)?;
                matched
                    .iter()
                    .position(|(key, id, _)| {
                        position_cmp(&(key.clone(), *id), &after, plan.order.descending)
                            == Ordering::Greater
                    })
                    .unwrap_or(matched.len())
            }
        };

        let remaining = &matched[start..];
        let page: Vec<_> = remaining.iter().take(plan.limit).collect();
        let next_cursor = if remaining.len() > plan.limit {
            page.last()
                .map(|(key, id, _)| Self::encode_cursor(plan, key, *id))
                .transpose()?
        } else {
            None
        };

        Ok(Page {
            items: page.into_iter().map(|(_, _, e)| e.clone()).collect(),
            next_cursor,
        })
    }
}
