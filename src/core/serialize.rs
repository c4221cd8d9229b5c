//! Schema-restricted JSON rendering of entities and pages
//!
//! The serializer filters on every call: it walks the type's
//! [`PropertySchema`] and asks the entity for each permitted attribute, so
//! an attribute outside the schema never reaches the output even when the
//! entity object carries it. The identity field always renders as a string.

use serde_json::{Map, Value, json};

use crate::core::entity::Entity;

/// Serialize one entity to a mapping restricted to its property schema.
///
/// Single-entity responses are this bare mapping, with no outer envelope.
/// The asymmetry with [`serialize_page`] is part of the external contract
/// and must not be normalized away.
pub fn serialize_entity<T: Entity>(entity: &T) -> Map<String, Value> {
    let mut out = Map::new();
    for name in T::properties().names() {
        if name == "id" {
            out.insert(name.to_string(), Value::String(entity.id().to_string()));
            continue;
        }
        let Some(value) = entity.field_value(name) else {
            continue;
        };
        out.insert(name.to_string(), value.to_json());
    }
    out
}

/// Serialize a listing page to the success envelope.
///
/// `more_url` is the full next-page URL the caller built from the raw
/// continuation token, or `None` when the listing is exhausted; it renders
/// as `null` so clients can detect the last page.
pub fn serialize_page<T: Entity>(items: &[T], more_url: Option<String>) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|entity| Value::Object(serialize_entity(entity)))
        .collect();
    json!({
        "status": "success",
        "items": items,
        "more_cursor": more_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use crate::core::schema::PropertySchema;
    use chrono::{DateTime, Utc};
    use std::sync::OnceLock;
    use uuid::Uuid;

    /// Entity whose `field_value` answers more attributes than its schema
    /// permits, to prove the serializer filters defensively.
    #[derive(Clone, Debug)]
    struct Account {
        id: Uuid,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        version: i64,
        name: String,
        api_token: String,
    }

    impl Account {
        fn sample() -> Self {
            let now = Utc::now();
            Self {
                id: Uuid::new_v4(),
                created: now,
                modified: now,
                version: 3,
                name: "alice".to_string(),
                api_token: "hunter2".to_string(),
            }
        }
    }

    impl Entity for Account {
        fn kind() -> &'static str {
            "account"
        }

        fn attributes() -> &'static [&'static str] {
            &[
                "id",
                "version",
                "created",
                "modified",
                "name",
                "api_token",
            ]
        }

        fn properties() -> &'static PropertySchema {
            static SCHEMA: OnceLock<PropertySchema> = OnceLock::new();
            // api_token is deliberately NOT exposed
            SCHEMA.get_or_init(|| {
                PropertySchema::base()
                    .with(&["name"])
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
                "api_token" => Some(FieldValue::String(self.api_token.clone())),
                _ => None,
            }
        }

        fn touch(&mut self) {
            self.modified = Utc::now();
        }
    }

    #[test]
    fn test_output_keys_are_subset_of_schema() {
        let account = Account::sample();
        let out = serialize_entity(&account);
        for key in out.keys() {
            assert!(
                Account::properties().contains(key),
                "leaked attribute: {key}"
            );
        }
    }

    #[test]
    fn test_internal_attribute_never_appears() {
        let account = Account::sample();
        let out = serialize_entity(&account);
        assert!(!out.contains_key("api_token"));
        assert_eq!(out["name"], "alice");
    }

    #[test]
    fn test_id_renders_as_string() {
        let account = Account::sample();
        let out = serialize_entity(&account);
        assert_eq!(out["id"], Value::String(account.id.to_string()));
    }

    #[test]
    fn test_all_schema_fields_present() {
        let account = Account::sample();
        let out = serialize_entity(&account);
        assert_eq!(out.len(), Account::properties().len());
    }

    #[test]
    fn test_page_envelope_with_more() {
        let accounts = vec![Account::sample(), Account::sample()];
        let envelope = serialize_page(&accounts, Some("/_s/account/?cursor=abc".to_string()));
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["items"].as_array().unwrap().len(), 2);
        assert_eq!(envelope["more_cursor"], "/_s/account/?cursor=abc");
    }

    #[test]
    fn test_page_envelope_exhausted_is_null() {
        let envelope = serialize_page::<Account>(&[], None);
        assert_eq!(envelope["items"].as_array().unwrap().len(), 0);
        assert!(envelope["more_cursor"].is_null());
    }
}
