pub mod auth;

pub use auth::{issue_token, user_auth_middleware, CurrentUser, UserClaims};
