//! Runtime configuration loading and the deployment build stamp

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::core::query::PageLimits;

/// Process-level configuration.
///
/// Distinct from [`crate::entities::settings::AppSettings`]: this is the
/// static bootstrap read from file/environment at startup; the settings
/// entity lives in the store and is editable through the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the exposure layer binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Page-size bounds applied to every listing
    #[serde(default)]
    pub pages: PageLimits,

    /// Order applied when a listing request carries none
    #[serde(default = "default_order")]
    pub default_order: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_order() -> String {
    "-created".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            pages: PageLimits::default(),
            default_order: default_order(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml_str(&content)?)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// The build identifier of the running deployment, stamped onto every
/// entity at creation for provenance. Read once from `STOA_BUILD_STAMP`;
/// missing or unparseable values stamp as 0.
pub fn build_stamp() -> i64 {
    static STAMP: OnceLock<i64> = OnceLock::new();
    *STAMP.get_or_init(|| {
        std::env::var("STOA_BUILD_STAMP")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    })
}
