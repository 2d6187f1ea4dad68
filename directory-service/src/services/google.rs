//! Google ID token verification.
//!
//! Tokens are RS256 JWTs signed with one of Google's rotating keys. The key
//! set is fetched from Google's JWKS endpoint and cached in-process.

use async_trait::async_trait;
use jsonwebtoken::{
    decode, decode_header,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::services::ServiceError;

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const JWKS_TTL: Duration = Duration::from_secs(3600);
/// An unknown `kid` only forces a refetch once the cached set is this old.
const JWKS_MIN_REFRESH: Duration = Duration::from_secs(60);

/// Canonical identity extracted from a verified assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Every failure is reported as `InvalidAssertion`.
    async fn verify(&self, assertion: &str) -> Result<GoogleIdentity, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleClaims {
    fn into_identity(self) -> Result<GoogleIdentity, ServiceError> {
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or(ServiceError::InvalidAssertion)?;

        if !self.email_verified {
            tracing::warn!(email = %email, "Google account email is not verified");
            return Err(ServiceError::InvalidAssertion);
        }

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(GoogleIdentity {
            email,
            name,
            picture: self.picture.filter(|p| !p.is_empty()),
        })
    }
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies Google ID tokens for one OAuth client id.
pub struct GoogleVerifier {
    client: Client,
    client_id: String,
    jwks_url: String,
    cache: RwLock<Option<CachedKeys>>,
}

impl GoogleVerifier {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            client_id: client_id.into(),
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            cache: RwLock::new(None),
        }
    }

    /// Verifier with a pre-loaded key set.
    pub fn with_keys(client_id: impl Into<String>, keys: JwkSet) -> Self {
        let verifier = Self::new(client_id);
        Self {
            cache: RwLock::new(Some(CachedKeys {
                keys,
                fetched_at: Instant::now(),
            })),
            ..verifier
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet, ServiceError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch Google JWKS");
                ServiceError::InvalidAssertion
            })?;

        response.json::<JwkSet>().await.map_err(|e| {
            tracing::error!(error = %e, "Google JWKS response is not a key set");
            ServiceError::InvalidAssertion
        })
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, ServiceError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < JWKS_TTL {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return Ok(jwk.clone());
                    }
                    if age < JWKS_MIN_REFRESH {
                        return Err(ServiceError::InvalidAssertion);
                    }
                }
            }
        }

        let keys = self.fetch_keys().await?;
        let jwk = keys.find(kid).cloned();

        *self.cache.write().await = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });

        jwk.ok_or_else(|| {
            tracing::warn!(kid = %kid, "Google token signed with an unknown key");
            ServiceError::InvalidAssertion
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, assertion: &str) -> Result<GoogleIdentity, ServiceError> {
        let header = decode_header(assertion).map_err(|_| ServiceError::InvalidAssertion)?;
        if header.alg != Algorithm::RS256 {
            return Err(ServiceError::InvalidAssertion);
        }
        let kid = header.kid.ok_or(ServiceError::InvalidAssertion)?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|_| ServiceError::InvalidAssertion)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<GoogleClaims>(assertion, &key, &validation).map_err(|e| {
            tracing::warn!(error = %e, "Google ID token rejected");
            ServiceError::InvalidAssertion
        })?;

        data.claims.into_identity()
    }
}

/// Deterministic verifier: accepts only the assertions it was given.
#[derive(Default)]
pub struct MockIdentityVerifier {
    identities: Mutex<HashMap<String, GoogleIdentity>>,
}

impl MockIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(self, assertion: &str, identity: GoogleIdentity) -> Self {
        self.insert(assertion, identity);
        self
    }

    pub fn insert(&self, assertion: &str, identity: GoogleIdentity) {
        if let Ok(mut map) = self.identities.lock() {
            map.insert(assertion.to_string(), identity);
        }
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, assertion: &str) -> Result<GoogleIdentity, ServiceError> {
        self.identities
            .lock()
            .ok()
            .and_then(|map| map.get(assertion).cloned())
            .ok_or(ServiceError::InvalidAssertion)
    }
}
