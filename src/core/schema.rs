//! Serialization allowlists composed per entity type
//!
//! Every entity type declares the closed set of attribute names it is
//! allowed to expose externally. A type's schema is the union of the shared
//! base set and its own declared additions; nothing is inherited silently.
//! Schemas are resolved once per type (inside a `OnceLock` initializer) and
//! validated there, so a bad declaration fails at definition time rather
//! than on a request path.

use std::collections::BTreeSet;

/// Property names every schema must carry
pub const CORE_PROPERTIES: [&str; 4] = ["id", "version", "created", "modified"];

/// The allowlist of attribute names one entity type may expose
#[derive(Debug, Clone)]
pub struct PropertySchema {
    names: BTreeSet<&'static str>,
}

impl PropertySchema {
    /// The base schema shared by every entity type: `id`, `version`,
    /// `created`, `modified`.
    pub fn base() -> Self {
        Self {
            names: CORE_PROPERTIES.iter().copied().collect(),
        }
    }

    /// Add type-specific property names to the schema
    pub fn with(mut self, additions: &[&'static str]) -> Self {
        self.names.extend(additions.iter().copied());
        self
    }

    /// Validate the composed schema against the entity's attribute universe
    /// and return it ready for use.
    ///
    /// # Panics
    ///
    /// Panics when a core property is missing or when a schema name is not a
    /// declared attribute of the entity. Both are definition bugs; resolution
    /// runs once per type at first use, never per request.
    pub fn resolve(self, kind: &str, attributes: &[&'static str]) -> Self {
        for core in CORE_PROPERTIES {
            assert!(
                self.names.contains(core),
                "property schema for '{}' is missing core property '{}'",
                kind,
                core
            );
        }
        for name in &self.names {
            assert!(
                attributes.contains(name),
                "property schema for '{}' exposes '{}', which is not a declared attribute",
                kind,
                name
            );
        }
        self
    }

    /// Whether the schema permits exposing the named attribute
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Iterate the permitted attribute names
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// Number of permitted attribute names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema is empty (never true for a resolved schema)
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
