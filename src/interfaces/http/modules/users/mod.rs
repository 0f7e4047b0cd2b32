//! Users module: registration and guarded user management

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
