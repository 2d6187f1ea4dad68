use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::OnceLock;

/// Throwaway hash verified when there is no stored hash to check against.
pub(crate) static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Newtype for an Argon2 PHC hash string
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password using Argon2id with a freshly generated salt.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Check a password against a stored hash.
///
/// A hash that cannot be parsed never matches.
pub fn verify_password(password: &Password, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        tracing::warn!("Stored password hash is malformed");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed_hash)
        .is_ok()
}

/// Pays the cost of a real verification without a stored hash. Never matches.
pub fn verify_against_decoy(password: &Password) -> bool {
    let decoy = DECOY_HASH.get_or_init(|| {
        hash_password(&Password::new("decoy-credential".to_string()))
            .map(PasswordHashString::into_string)
            .map_err(|e| tracing::error!(error = %e, "Failed to build decoy hash"))
            .ok()
    });

    if let Some(hash) = decoy {
        verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = Password::new("secret123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(!hash.as_str().contains("secret123"));
    }

    #[test]
    fn test_verify_password_roundtrip() {
        let password = Password::new("secret123".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, hash.as_str()));
        assert!(!verify_password(
            &Password::new("secret124".to_string()),
            hash.as_str()
        ));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let password = Password::new("secret123".to_string());
        let hash1 = hash_password(&password).expect("Failed to hash password");
        let hash2 = hash_password(&password).expect("Failed to hash password");

        assert_ne!(hash1.as_str(), hash2.as_str());
        assert!(verify_password(&password, hash1.as_str()));
        assert!(verify_password(&password, hash2.as_str()));
    }

    #[test]
    fn test_malformed_hash_is_false() {
        let password = Password::new("secret123".to_string());
        assert!(!verify_password(&password, ""));
        assert!(!verify_password(&password, "not-a-phc-string"));
        assert!(!verify_password(&password, "$2a$10$bcryptstylehashvalue"));
    }

    #[test]
    fn test_debug_does_not_leak() {
        let password = Password::new("secret123".to_string());
        assert_eq!(format!("{:?}", password), "Password(***)");
    }

    #[test]
    fn decoy_never_matches() {
        assert!(!verify_against_decoy(&Password::new("decoy-credential".to_string())));
        assert!(!verify_against_decoy(&Password::new("secret123".to_string())));
        assert!(matches!(DECOY_HASH.get(), Some(Some(hash)) if hash.starts_with("$argon2id$")));
    }
}
