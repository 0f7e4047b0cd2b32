//! # User Service
//!
//! User management over HTTP with admin-only login and JWT bearer tokens.
//!
//! ## Architecture
//!
//! - **domain**: User record, DTOs and the store interface
//! - **application**: `UserService`, the login and user-management use-cases
//! - **auth**: token service (issue + validate) and the access guard middleware
//! - **infrastructure**: SeaORM/SQLite store and the in-memory store
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: error types and shutdown signalling

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, InMemoryUserRepository, SeaOrmUserRepository};

// Re-export API router
pub use interfaces::create_api_router;
