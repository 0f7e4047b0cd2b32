//! Authentication and authorization
//!
//! `jwt` is the token service (issue + validate); `middleware` is the
//! access guard placed in front of protected routes.

pub mod jwt;
pub mod middleware;

pub use jwt::{JwtConfig, TokenClaims, TokenError, TokenService};
pub use middleware::{
    auth_middleware, extract_bearer_token, AccessGuard, AuthError, AuthenticatedUser,
};
