//! The user account entity
//!
//! Accounts are provisioned lazily on first sign-in through an external
//! identity provider and looked up by provider id thereafter. Usernames
//! are unique across all users; the gate enforces that at provisioning.
//! Provider linkage ids, email and the privilege flags stay internal;
//! the property schema exposes only name, username, avatar and locale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::config::build_stamp;
use crate::core::auth::{ProviderIdentity, ProviderKind};
use crate::core::entity::Entity;
use crate::core::field::FieldValue;
use crate::core::schema::PropertySchema;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub version: i64,

    pub name: String,
    pub username: String,
    pub email: String,
    pub locale: String,

    pub active: bool,
    pub admin: bool,

    pub federated_id: String,
    pub facebook_id: String,
    pub twitter_id: String,
}

impl User {
    /// Create a fresh, active, non-admin account
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created: now,
            modified: now,
            version: build_stamp(),
            name: name.into(),
            username: username.into(),
            email: String::new(),
            locale: String::new(),
            active: true,
            admin: false,
            federated_id: String::new(),
            facebook_id: String::new(),
            twitter_id: String::new(),
        }
    }

    /// Build the account provisioned on first sight of a provider id,
    /// seeded with the provider-supplied name and email
    pub fn provision(identity: &ProviderIdentity, username: String) -> Self {
        let mut user = Self::new(identity.name.clone(), username);
        user.email = identity.email.trim().to_lowercase();
        match identity.provider {
            ProviderKind::Federated => user.federated_id = identity.subject.clone(),
            ProviderKind::Facebook => user.facebook_id = identity.subject.clone(),
            ProviderKind::Twitter => user.twitter_id = identity.subject.clone(),
        }
        user
    }

    /// Avatar URL computed from the email digest; never stored
    pub fn avatar_url(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.email.trim().to_lowercase().as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        format!("https://www.gravatar.com/avatar/{hex}?d=identicon&r=x")
    }
}

impl Entity for User {
    fn kind() -> &'static str {
        "user"
    }

    fn attributes() -> &'static [&'static str] {
        &[
            "id",
            "version",
            "created",
            "modified",
            "name",
            "username",
            "email",
            "locale",
            "active",
            "admin",
            "federated_id",
            "facebook_id",
            "twitter_id",
            "avatar_url",
        ]
    }

    fn properties() -> &'static PropertySchema {
        static SCHEMA: OnceLock<PropertySchema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            PropertySchema::base()
                .with(&["name", "username", "avatar_url", "locale"])
                .resolve(Self::kind(), Self::attributes())
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::Uuid(self.id)),
            "version" => Some(FieldValue::Integer(self.version)),
            "created" => Some(FieldValue::DateTime(self.created)),
            "modified" => Some(FieldValue::DateTime(self.modified)),
            "name" => Some(FieldValue::String(self.name.clone())),
            "username" => Some(FieldValue::String(self.username.clone())),
            "email" => Some(FieldValue::String(self.email.clone())),
            "locale" => Some(FieldValue::String(self.locale.clone())),
            "active" => Some(FieldValue::Boolean(self.active)),
            "admin" => Some(FieldValue::Boolean(self.admin)),
            "federated_id" => Some(FieldValue::String(self.federated_id.clone())),
            "facebook_id" => Some(FieldValue::String(self.facebook_id.clone())),
            "twitter_id" => Some(FieldValue::String(self.twitter_id.clone())),
            "avatar_url" => Some(FieldValue::String(self.avatar_url())),
            _ => None,
        }
    }

    fn touch(&mut self) {
        self.modified = Utc::now();
    }
}
