//! Services layer: authentication, authorization and image association.

pub mod auth;
mod database;
pub mod error;
pub mod google;
pub mod guard;
mod jwt;
pub mod media;
pub mod memory;
pub mod metrics;
pub mod storage;
pub mod store;
pub mod users;

pub use auth::{AuthService, FederatedSession, Lookup, Session};
pub use database::MongoDb;
pub use error::ServiceError;
pub use google::{GoogleIdentity, GoogleVerifier, IdentityVerifier, MockIdentityVerifier};
pub use guard::AuthorizationGuard;
pub use jwt::{SessionClaims, TokenService};
pub use media::{MediaService, StoredImage, PLACEHOLDER_IMAGE};
pub use memory::InMemoryStore;
pub use storage::{FileStore, LocalStorage};
pub use store::{EntityStore, IdentityStore};
pub use users::{ProfileUpdate, UserService};
