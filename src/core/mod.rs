//! Core module containing the generic exposure machinery
//!
//! Everything here is entity-type agnostic: the [`entity::Entity`] trait,
//! the [`schema::PropertySchema`] allowlist, the query/pagination pipeline,
//! the schema-restricted serializer and the authorization gates.

pub mod auth;
pub mod entity;
pub mod error;
pub mod field;
pub mod query;
pub mod schema;
pub mod serialize;
pub mod store;

pub use auth::{AuthGate, HeaderIdentityResolver, IdentityResolver, ProviderIdentity, ProviderKind};
pub use entity::Entity;
pub use error::ApiError;
pub use field::{FieldValue, valid_email};
pub use query::{Cursor, ListQuery, OrderSpec, Page, PageLimits, QueryPlan, retrieve_entities};
pub use schema::PropertySchema;
pub use serialize::{serialize_entity, serialize_page};
pub use store::{EntityStore, StoreError};
