//! HTTP REST API interfaces
//!
//! - `common`: error bodies and the validating JSON extractor
//! - `modules`: handlers and DTOs, one module per resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc};
