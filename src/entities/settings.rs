//! The global settings singleton and its process-wide cache
//!
//! Exactly one settings entity exists, stored under a well-known key and
//! created lazily on first read, so reads never fail on absence. Nearly
//! every request reads it (branding, feature toggles, locale default), so
//! the service caches it process-wide and refreshes the cache
//! synchronously on every successful write: the next read after a write
//! is always fresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::config::build_stamp;
use crate::core::entity::Entity;
use crate::core::error::ApiError;
use crate::core::field::FieldValue;
use crate::core::schema::PropertySchema;
use crate::core::store::EntityStore;
use std::sync::OnceLock;

/// The well-known key the singleton lives under
pub const SETTINGS_ID: Uuid = Uuid::nil();

/// Allowed values for the announcement banner kind
pub const ANNOUNCEMENT_KINDS: [&str; 4] = ["info", "warning", "success", "danger"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub version: i64,

    pub analytics_id: String,
    pub announcement_html: String,
    pub announcement_kind: String,
    pub brand_name: String,

    /// Empty means the feedback feature is not configured
    pub feedback_email: String,

    /// Session signing material; generated once, never exposed
    pub session_secret: String,
    pub locale: String,

    pub facebook_app_id: String,
    pub facebook_app_secret: String,
    pub twitter_consumer_key: String,
    pub twitter_consumer_secret: String,
}

impl AppSettings {
    /// The instance synthesized when the store holds none
    pub fn default_instance() -> Self {
        let now = Utc::now();
        Self {
            id: SETTINGS_ID,
            created: now,
            modified: now,
            version: build_stamp(),
            analytics_id: String::new(),
            announcement_html: String::new(),
            announcement_kind: "info".to_string(),
            brand_name: "stoa".to_string(),
            feedback_email: String::new(),
            session_secret: Uuid::new_v4().simple().to_string(),
            locale: "en".to_string(),
            facebook_app_id: String::new(),
            facebook_app_secret: String::new(),
            twitter_consumer_key: String::new(),
            twitter_consumer_secret: String::new(),
        }
    }

    /// Whether the feedback feature is configured
    pub fn feedback_enabled(&self) -> bool {
        !self.feedback_email.is_empty()
    }
}

impl Entity for AppSettings {
    fn kind() -> &'static str {
        "settings"
    }

    fn attributes() -> &'static [&'static str] {
        &[
            "id",
            "version",
            "created",
            "modified",
            "analytics_id",
            "announcement_html",
            "announcement_kind",
            "brand_name",
            "feedback_email",
            "session_secret",
            "locale",
            "facebook_app_id",
            "facebook_app_secret",
            "twitter_consumer_key",
            "twitter_consumer_secret",
        ]
    }

    fn properties() -> &'static PropertySchema {
        static SCHEMA: OnceLock<PropertySchema> = OnceLock::new();
        // Secrets stay out of the schema; client ids are public material
        SCHEMA.get_or_init(|| {
            PropertySchema::base()
                .with(&[
                    "analytics_id",
                    "announcement_html",
                    "announcement_kind",
                    "brand_name",
                    "feedback_email",
                    "locale",
                    "facebook_app_id",
                    "twitter_consumer_key",
                ])
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
            "analytics_id" => Some(FieldValue::String(self.analytics_id.clone())),
            "announcement_html" => Some(FieldValue::String(self.announcement_html.clone())),
            "announcement_kind" => Some(FieldValue::String(self.announcement_kind.clone())),
            "brand_name" => Some(FieldValue::String(self.brand_name.clone())),
            "feedback_email" => Some(FieldValue::String(self.feedback_email.clone())),
            "session_secret" => Some(FieldValue::String(self.session_secret.clone())),
            "locale" => Some(FieldValue::String(self.locale.clone())),
            "facebook_app_id" => Some(FieldValue::String(self.facebook_app_id.clone())),
            "facebook_app_secret" => Some(FieldValue::String(self.facebook_app_secret.clone())),
            "twitter_consumer_key" => Some(FieldValue::String(self.twitter_consumer_key.clone())),
            "twitter_consumer_secret" => {
                Some(FieldValue::String(self.twitter_consumer_secret.clone()))
            }
            _ => None,
        }
    }

    fn touch(&mut self) {
        self.modified = Utc::now();
    }
}

/// Read-mostly access to the settings singleton with a process-wide cache
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn EntityStore<AppSettings>>,
    cache: Arc<RwLock<Option<AppSettings>>>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn EntityStore<AppSettings>>) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the singleton, synthesizing and persisting a default-valued
    /// instance when the store holds none. Concurrent first reads may
    /// race to create it; all write the same key, so the last writer
    /// wins and exactly one instance exists either way.
    pub async fn get(&self) -> Result<AppSettings, ApiError> {
        if let Some(cached) = self.read_cache()? {
            return Ok(cached);
        }
        let settings = match self.store.get(&SETTINGS_ID).await? {
            Some(existing) => existing,
            None => {
                tracing::info!("settings singleton absent, creating default instance");
                self.store.put(AppSettings::default_instance()).await?
            }
        };
        self.write_cache(Some(settings.clone()))?;
        Ok(settings)
    }

    /// Apply a mutation to the singleton and persist it. The cache is
    /// refreshed synchronously, so any read after this call observes the
    /// update.
    pub async fn update<F>(&self, apply: F) -> Result<AppSettings, ApiError>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut settings = self.get().await?;
        apply(&mut settings);
        let written = self.store.put(settings).await?;
        self.write_cache(Some(written.clone()))?;
        Ok(written)
    }

    /// Drop the cached instance; the next read goes to the store
    pub fn invalidate(&self) -> Result<(), ApiError> {
        self.write_cache(None)
    }

    fn read_cache(&self) -> Result<Option<AppSettings>, ApiError> {
        self.cache
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| ApiError::Internal(format!("settings cache lock poisoned: {e}")))
    }

    fn write_cache(&self, value: Option<AppSettings>) -> Result<(), ApiError> {
        let mut guard = self
            .cache
            .write()
            .map_err(|e| ApiError::Internal(format!("settings cache lock poisoned: {e}")))?;
        *guard = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::serialize::serialize_entity;
    use crate::storage::InMemoryStore;

    fn service() -> (SettingsService, Arc<InMemoryStore<AppSettings>>) {
        let store = Arc::new(InMemoryStore::new());
        (
            SettingsService::new(store.clone() as Arc<dyn EntityStore<AppSettings>>),
            store,
        )
    }

    #[tokio::test]
    async fn test_first_read_synthesizes_default() {
        let (service, store) = service();
        assert!(store.is_empty());
        let settings = service.get().await.unwrap();
        assert_eq!(settings.brand_name, "stoa");
        assert_eq!(settings.locale, "en");
        assert!(!settings.feedback_enabled());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_reads_return_identical_instance() {
        let (service, _store) = service();
        let first = service.get().await.unwrap();
        let second = service.get().await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.session_secret, second.session_secret);
        assert_eq!(first.modified, second.modified);
    }

    #[tokio::test]
    async fn test_update_is_visible_to_next_read() {
        let (service, _store) = service();
        service
            .update(|s| s.feedback_email = "team@example.com".to_string())
            .await
            .unwrap();
        let settings = service.get().await.unwrap();
        assert_eq!(settings.feedback_email, "team@example.com");
        assert!(settings.feedback_enabled());
    }

    #[tokio::test]
    async fn test_update_moves_modified() {
        let (service, _store) = service();
        let before = service.get().await.unwrap();
        let after = service
            .update(|s| s.brand_name = "acme".to_string())
            .await
            .unwrap();
        assert!(after.modified > before.modified);
        assert_eq!(after.created, before.created);
    }

    #[tokio::test]
    async fn test_invalidate_forces_store_read() {
        let (service, store) = service();
        service.get().await.unwrap();

        // A write that bypasses this service instance (e.g. another worker)
        let mut direct = store.get(&SETTINGS_ID).await.unwrap().unwrap();
        direct.brand_name = "other-worker".to_string();
        store.put(direct).await.unwrap();

        // The cache still has the stale copy until invalidated
        assert_eq!(service.get().await.unwrap().brand_name, "stoa");
        service.invalidate().unwrap();
        assert_eq!(service.get().await.unwrap().brand_name, "other-worker");
    }

    #[tokio::test]
    async fn test_concurrent_first_access_leaves_one_instance() {
        let (service, store) = service();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.get().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_schema_hides_secrets() {
        let settings = AppSettings::default_instance();
        let out = serialize_entity(&settings);
        for hidden in [
            "session_secret",
            "facebook_app_secret",
            "twitter_consumer_secret",
        ] {
            assert!(!out.contains_key(hidden), "leaked {hidden}");
        }
        assert_eq!(out["brand_name"], "stoa");
        assert!(out.contains_key("facebook_app_id"));
    }
}
