//! Concrete entity types managed by the document store

pub mod settings;
pub mod user;

pub use settings::{AppSettings, SettingsService};
pub use user::User;
