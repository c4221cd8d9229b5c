//! # Stoa
//!
//! A generic entity-exposure core for document-store-backed applications.
//!
//! ## Features
//!
//! - **Property schemas**: explicit, composed serialization allowlists per
//!   entity type, validated at definition time
//! - **Cursor pagination**: filtered, ordered, resumable listings with
//!   opaque store-native continuation tokens
//! - **Schema-restricted serialization**: attributes outside the schema
//!   never reach a payload, enforced per call
//! - **Authorization gates**: current-user resolution with lazy
//!   provisioning, plus authenticated and administrator guard levels
//! - **Settings singleton**: one lazily-created global configuration
//!   entity, cached process-wide with invalidate-on-write
//! - **Dual surfaces**: the same pipeline feeds a JSON API under `/_s/`
//!   and a human-facing surface elsewhere
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stoa::prelude::*;
//!
//! let config = AppConfig::default();
//! let users: Arc<dyn EntityStore<User>> = Arc::new(InMemoryStore::new());
//! let settings: Arc<dyn EntityStore<AppSettings>> = Arc::new(InMemoryStore::new());
//! let state = AppState::new(
//!     users,
//!     settings,
//!     Arc::new(HeaderIdentityResolver),
//!     Arc::new(LogNotifier),
//!     &config,
//! );
//! stoa::server::serve(&config, state).await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthGate, HeaderIdentityResolver, IdentityResolver, ProviderIdentity, ProviderKind},
        entity::Entity,
        error::ApiError,
        field::{FieldValue, valid_email},
        query::{Cursor, ListQuery, OrderSpec, Page, PageLimits, retrieve_entities},
        schema::PropertySchema,
        serialize::{serialize_entity, serialize_page},
        store::{EntityStore, StoreError},
    };

    // === Entities ===
    pub use crate::entities::{AppSettings, SettingsService, User};

    // === Storage ===
    pub use crate::storage::InMemoryStore;

    // === Server ===
    pub use crate::config::AppConfig;
    pub use crate::server::{
        AppState, LogNotifier, Notifier, RecordingNotifier, Surface, build_router,
    };

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
