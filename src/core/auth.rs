//! Identity resolution and authorization gates
//!
//! Per request the state machine is `Anonymous → Authenticated →
//! (Administrator | RegularUser)`. Guards are pure gates: they never write
//! except for the one-time provisioning of a user on first sight of a
//! provider id. A denial short-circuits the handler before any query or
//! serialization work, so denied requests have no side effects.

use async_trait::async_trait;
use axum::http::HeaderMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::error::ApiError;
use crate::core::field::FieldValue;
use crate::core::store::EntityStore;
use crate::entities::user::User;

/// External identity providers a user account can be linked to.
///
/// At most one linkage id per provider per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Federated,
    Facebook,
    Twitter,
}

impl ProviderKind {
    /// Parse the provider tag carried in the identity material
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "federated" => Some(ProviderKind::Federated),
            "facebook" => Some(ProviderKind::Facebook),
            "twitter" => Some(ProviderKind::Twitter),
            _ => None,
        }
    }

    /// The user attribute holding this provider's linkage id
    pub fn linkage_field(&self) -> &'static str {
        match self {
            ProviderKind::Federated => "federated_id",
            ProviderKind::Facebook => "facebook_id",
            ProviderKind::Twitter => "twitter_id",
        }
    }
}

/// A resolved external identity: who the provider says this request is
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub provider: ProviderKind,

    /// Provider-scoped stable subject id
    pub subject: String,

    /// Display name supplied by the provider; seeds the user on provisioning
    pub name: String,

    /// Email supplied by the provider; may be empty
    pub email: String,
}

/// Identity material was present but malformed
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unresolvable identity: {0}")]
    Unresolvable(String),
}

/// Maps a request's identity material to a [`ProviderIdentity`].
///
/// `Ok(None)` means the request is anonymous; `Err` means identity material
/// was present but malformed. Session handling and the sign-in flow itself
/// live outside this crate; the resolver only reads their result.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<ProviderIdentity>, AuthError>;
}

/// Resolver reading the identity the front door injects as request headers:
/// `x-auth-provider`, `x-auth-subject`, `x-auth-name`, `x-auth-email`.
pub struct HeaderIdentityResolver;

impl HeaderIdentityResolver {
    fn header<'h>(headers: &'h HeaderMap, name: &str) -> Result<Option<&'h str>, AuthError> {
        match headers.get(name) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .map(Some)
                .map_err(|_| AuthError::Unresolvable(format!("header {name} is not valid text"))),
        }
    }
}

#[async_trait]
impl IdentityResolver for HeaderIdentityResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<ProviderIdentity>, AuthError> {
        let Some(provider_raw) = Self::header(headers, "x-auth-provider")? else {
            return Ok(None);
        };
        let provider = ProviderKind::parse(provider_raw).ok_or_else(|| {
            AuthError::Unresolvable(format!("unknown identity provider '{provider_raw}'"))
        })?;
        let subject = Self::header(headers, "x-auth-subject")?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::Unresolvable("missing provider subject id".to_string()))?
            .to_string();
        let name = Self::header(headers, "x-auth-name")?.unwrap_or("").to_string();
        let email = Self::header(headers, "x-auth-email")?.unwrap_or("").to_string();
        Ok(Some(ProviderIdentity {
            provider,
            subject,
            name,
            email,
        }))
    }
}

/// The authorization-checking stage run before protected operations
#[derive(Clone)]
pub struct AuthGate {
    users: Arc<dyn EntityStore<User>>,
    resolver: Arc<dyn IdentityResolver>,
}

impl AuthGate {
    pub fn new(users: Arc<dyn EntityStore<User>>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { users, resolver }
    }

    /// Resolve the current request to a user, provisioning one on first
    /// sight of a provider id. `Ok(None)` means anonymous; malformed
    /// identity material surfaces as `Unauthorized`.
    pub async fn current_user(&self, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
        let identity = self
            .resolver
            .resolve(headers)
            .await
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;
        match identity {
            None => Ok(None),
            Some(identity) => Ok(Some(self.user_for_identity(identity).await?)),
        }
    }

    /// Guard: the request must carry a resolvable identity and the account
    /// must be active. Inactive accounts are denied, a deliberate policy:
    /// deactivation is the admin's revocation switch.
    pub async fn require_user(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        match self.current_user(headers).await? {
            None => {
                tracing::debug!("denied anonymous request to protected operation");
                Err(ApiError::Unauthorized("sign-in required".to_string()))
            }
            Some(user) if !user.active => {
                tracing::debug!(user = %user.username, "denied inactive account");
                Err(ApiError::Unauthorized("account is inactive".to_string()))
            }
            Some(user) => Ok(user),
        }
    }

    /// Guard: [`Self::require_user`] plus the administrator flag
    pub async fn require_admin(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let user = self.require_user(headers).await?;
        if user.admin {
            Ok(user)
        } else {
            tracing::debug!(user = %user.username, "denied non-admin");
            Err(ApiError::Forbidden(
                "administrator access required".to_string(),
            ))
        }
    }

    async fn user_for_identity(&self, identity: ProviderIdentity) -> Result<User, ApiError> {
        let field = identity.provider.linkage_field();
        let subject = FieldValue::String(identity.subject.clone());
        if let Some(user) = self.users.find_one(field, &subject).await? {
            return Ok(user);
        }

        let username = self.unique_username(&identity).await?;
        let user = User::provision(&identity, username);
        tracing::info!(
            user = %user.username,
            provider = ?identity.provider,
            "provisioned user on first sign-in"
        );
        Ok(self.users.put(user).await?)
    }

    /// Derive a username from the identity and suffix until it is unique
    async fn unique_username(&self, identity: &ProviderIdentity) -> Result<String, ApiError> {
        let base = username_base(identity);
        let mut candidate = base.clone();
        let mut suffix = 1usize;
        loop {
            let taken = self
                .users
                .find_one("username", &FieldValue::String(candidate.clone()))
                .await?;
            if taken.is_none() {
                return Ok(candidate);
            }
            suffix += 1;
            candidate = format!("{base}-{suffix}");
        }
    }
}

fn username_base(identity: &ProviderIdentity) -> String {
    let from_email = identity
        .email
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();
    let source = if from_email.is_empty() {
        identity.name.to_lowercase()
    } else {
        from_email
    };
    let slug: String = source
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '.'
            }
        })
        .collect();
    let slug = slug.trim_matches('.').to_string();
    if slug.is_empty() { "user".to_string() } else { slug }
}
