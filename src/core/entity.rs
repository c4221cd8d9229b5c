//! Entity trait defining the core abstraction for all persisted types
//!
//! All entities carry a stable identity, audit timestamps, a deployment
//! version stamp and a [`PropertySchema`] bounding what the serializer may
//! expose. Dynamic attribute access through [`Entity::field_value`] is what
//! lets filtering, ordering and serialization stay generic over types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::field::FieldValue;
use crate::core::schema::PropertySchema;

/// Base trait for all entities in the system.
///
/// Implementations must answer `field_value` for every name listed in
/// [`Entity::attributes`]; that list is also the universe query parameters
/// are validated against, so an unknown `order` or filter name is rejected
/// before any store access happens.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The singular kind name (e.g., "user")
    fn kind() -> &'static str;

    /// Every attribute name this type can answer through [`Entity::field_value`],
    /// including computed ones
    fn attributes() -> &'static [&'static str];

    /// The composed serialization allowlist for this type, resolved once
    fn properties() -> &'static PropertySchema;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> Uuid;

    /// Get the creation timestamp; set once, never changed
    fn created(&self) -> DateTime<Utc>;

    /// Get the last modification timestamp; moves on every successful write
    fn modified(&self) -> DateTime<Utc>;

    /// Get the build stamp of the deployment that created this entity.
    /// Provenance only, never mutated.
    fn version(&self) -> i64;

    /// Dynamic attribute access used by filtering, ordering and serialization
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Stamp a write: the modified timestamp moves, created never does
    fn touch(&mut self);
}
