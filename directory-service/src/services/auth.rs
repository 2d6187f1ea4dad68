use std::sync::Arc;

use crate::models::{User, UserChanges};
use crate::services::google::{GoogleIdentity, IdentityVerifier};
use crate::services::jwt::TokenService;
use crate::services::metrics::record_login;
use crate::services::store::IdentityStore;
use crate::services::ServiceError;
use crate::utils::{hash_password, verify_against_decoy, verify_password, Password};

/// A freshly issued session token and the identity it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Result of a Google sign-in: the session plus what Google asserted.
#[derive(Debug, Clone)]
pub struct FederatedSession {
    pub session: Session,
    pub identity: GoogleIdentity,
}

/// Outcome of looking an identity up by email.
#[derive(Debug)]
pub enum Lookup {
    Found(User),
    Absent,
}

#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn IdentityStore>,
    tokens: TokenService,
    verifier: Arc<dyn IdentityVerifier>,
}

impl AuthService {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        tokens: TokenService,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            identities,
            tokens,
            verifier,
        }
    }

    async fn lookup(&self, email: &str) -> Result<Lookup, ServiceError> {
        Ok(match self.identities.find_by_email(email).await? {
            Some(user) => Lookup::Found(user),
            None => Lookup::Absent,
        })
    }

    fn session_for(&self, user: User) -> Result<Session, ServiceError> {
        let token = self.tokens.issue(&user.id)?;
        Ok(Session { token, user })
    }

    /// Email and password sign-in.
    ///
    /// Unknown email and wrong password both fail with `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &Password) -> Result<Session, ServiceError> {
        let user = match self.lookup(email).await? {
            Lookup::Found(user) => user,
            Lookup::Absent => {
                verify_against_decoy(password);
                tracing::info!("Login attempt for unknown email");
                record_login("password", "rejected");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let matches = match user.password.as_deref() {
            Some(hash) => verify_password(password, hash),
            None => verify_against_decoy(password),
        };

        if !matches {
            tracing::info!(user_id = %user.id, "Login attempt with wrong password");
            record_login("password", "rejected");
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        record_login("password", "success");
        self.session_for(user)
    }

    /// Google sign-in: verifies the assertion, then creates or flags the identity.
    pub async fn login_federated(&self, assertion: &str) -> Result<FederatedSession, ServiceError> {
        let identity = match self.verifier.verify(assertion).await {
            Ok(identity) => identity,
            Err(e) => {
                record_login("google", "rejected");
                return Err(e);
            }
        };

        let user = match self.lookup(&identity.email).await? {
            Lookup::Found(user) => self.mark_federated(user).await?,
            Lookup::Absent => {
                let user = User::new_federated(
                    identity.name.clone(),
                    identity.email.clone(),
                    identity.picture.clone(),
                );
                match self.identities.insert(user).await {
                    Ok(user) => {
                        tracing::info!(user_id = %user.id, "Identity created from Google sign-in");
                        user
                    }
                    // A concurrent first sign-in won the insert; converge on its record.
                    Err(ServiceError::EmailAlreadyRegistered) => match self.lookup(&identity.email).await? {
                        Lookup::Found(user) => self.mark_federated(user).await?,
                        Lookup::Absent => return Err(ServiceError::NotFound("User")),
                    },
                    Err(e) => return Err(e),
                }
            }
        };

        tracing::info!(user_id = %user.id, "User logged in with Google");
        record_login("google", "success");

        Ok(FederatedSession {
            session: self.session_for(user)?,
            identity,
        })
    }

    /// Sets the federated flag; the password hash is left as it is.
    async fn mark_federated(&self, user: User) -> Result<User, ServiceError> {
        if user.google {
            return Ok(user);
        }

        let changes = UserChanges {
            google: Some(true),
            ..Default::default()
        };
        self.identities
            .update(&user.id, &changes)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    /// Re-issues a token for an already authenticated identity.
    pub async fn renew(&self, uid: &str) -> Result<Session, ServiceError> {
        let user = self
            .identities
            .find_by_id(uid)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        self.session_for(user)
    }

    pub fn authorize(&self, token: &str) -> Result<String, ServiceError> {
        self.tokens.verify(token)
    }

    pub async fn register(
        &self,
        name: String,
        email: String,
        password: &Password,
    ) -> Result<Session, ServiceError> {
        if let Lookup::Found(_) = self.lookup(&email).await? {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let hash = hash_password(password)?;
        let user = self
            .identities
            .insert(User::new(name, email, hash.into_string()))
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::models::Role;
    use crate::services::google::MockIdentityVerifier;
    use crate::services::memory::InMemoryStore;

    fn identity(email: &str) -> GoogleIdentity {
        GoogleIdentity {
            email: email.to_string(),
            name: "Doc".to_string(),
            picture: Some("https://lh3.googleusercontent.com/a/doc".to_string()),
        }
    }

    fn service(store: Arc<InMemoryStore>) -> AuthService {
        let verifier = MockIdentityVerifier::new()
            .with_identity("assertion-1", identity("doc@x.com"))
            .with_identity("assertion-2", identity("doc@x.com"));

        AuthService::new(
            store,
            TokenService::new(&test_config().jwt),
            Arc::new(verifier),
        )
    }

    fn password(p: &str) -> Password {
        Password::new(p.to_string())
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_invalid_credentials() {
        let auth = service(Arc::new(InMemoryStore::new()));
        let res = auth.login("doc@x.com", &password("secret123")).await;
        assert!(matches!(res, Err(ServiceError::InvalidCredentials)));

        // The unknown email still went through a full hash verification.
        assert!(crate::utils::password::DECOY_HASH.get().is_some());
    }

    #[tokio::test]
    async fn login_wrong_password_is_indistinguishable() {
        let auth = service(Arc::new(InMemoryStore::new()));
        auth.register("Doc".into(), "doc@x.com".into(), &password("secret123"))
            .await
            .unwrap();

        let wrong = auth.login("doc@x.com", &password("secret124")).await;
        let unknown = auth.login("nobody@x.com", &password("secret123")).await;
        assert_eq!(
            wrong.unwrap_err().to_string(),
            unknown.unwrap_err().to_string()
        );
    }

    #[tokio::test]
    async fn registered_user_can_log_in_and_token_authorizes() {
        let auth = service(Arc::new(InMemoryStore::new()));
        let registered = auth
            .register("Doc".into(), "doc@x.com".into(), &password("secret123"))
            .await
            .unwrap();
        assert_eq!(registered.user.role, Role::User);

        let session = auth.login("doc@x.com", &password("secret123")).await.unwrap();
        assert_eq!(auth.authorize(&session.token).unwrap(), registered.user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let auth = service(Arc::new(InMemoryStore::new()));
        auth.register("Doc".into(), "doc@x.com".into(), &password("secret123"))
            .await
            .unwrap();

        let res = auth
            .register("Other".into(), "doc@x.com".into(), &password("secret456"))
            .await;
        assert!(matches!(res, Err(ServiceError::EmailAlreadyRegistered)));
    }

    #[tokio::test]
    async fn federated_login_is_idempotent_on_email() {
        let store = Arc::new(InMemoryStore::new());
        let auth = service(store.clone());

        let first = auth.login_federated("assertion-1").await.unwrap();
        let second = auth.login_federated("assertion-2").await.unwrap();

        assert_eq!(store.user_count(), 1);
        assert_eq!(first.session.user.id, second.session.user.id);
        assert!(second.session.user.google);
        assert!(second.session.user.password.is_none());
        assert_eq!(second.identity.email, "doc@x.com");
    }

    #[tokio::test]
    async fn federated_login_keeps_existing_password() {
        let store = Arc::new(InMemoryStore::new());
        let auth = service(store.clone());
        let registered = auth
            .register("Doc".into(), "doc@x.com".into(), &password("secret123"))
            .await
            .unwrap();

        let federated = auth.login_federated("assertion-1").await.unwrap();
        assert_eq!(federated.session.user.id, registered.user.id);
        assert!(federated.session.user.google);
        assert_eq!(federated.session.user.password, registered.user.password);

        // The password still works after the account became federated.
        assert!(auth.login("doc@x.com", &password("secret123")).await.is_ok());
    }

    #[tokio::test]
    async fn rejected_assertion_creates_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let auth = service(store.clone());

        let res = auth.login_federated("forged").await;
        assert!(matches!(res, Err(ServiceError::InvalidAssertion)));
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn federated_only_identity_cannot_use_password_login() {
        let auth = service(Arc::new(InMemoryStore::new()));
        auth.login_federated("assertion-1").await.unwrap();

        let res = auth.login("doc@x.com", &password("")).await;
        assert!(matches!(res, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn renew_reissues_for_existing_identity() {
        let auth = service(Arc::new(InMemoryStore::new()));
        let registered = auth
            .register("Doc".into(), "doc@x.com".into(), &password("secret123"))
            .await
            .unwrap();

        let renewed = auth.renew(&registered.user.id).await.unwrap();
        assert_eq!(auth.authorize(&renewed.token).unwrap(), registered.user.id);

        assert!(matches!(
            auth.renew("gone").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
