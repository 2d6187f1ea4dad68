use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::{JwtConfig, SESSION_TOKEN_LIFETIME_HOURS};
use crate::services::ServiceError;

/// Issues and verifies the stateless session tokens sent in `x-token`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

/// Claims of a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity id
    pub uid: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime: Duration::hours(SESSION_TOKEN_LIFETIME_HOURS),
        }
    }

    /// Sign a token for `uid`, valid for twelve hours from now.
    pub fn issue(&self, uid: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = SessionClaims {
            uid: uid.to_string(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))
    }

    /// Check signature and expiry and return the identity id.
    pub fn verify(&self, token: &str) -> Result<String, ServiceError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                ServiceError::InvalidToken
            })?;

        if data.claims.uid.is_empty() {
            return Err(ServiceError::InvalidToken);
        }

        Ok(data.claims.uid)
    }
}
