pub mod auth;

pub use auth::{token_middleware, AuthUser, TOKEN_HEADER};
