//! Identity module: login & user management
//!
//! Contains the `UserService` which orchestrates all user-related
//! use-cases: login, creation, profile updates, soft deletion.

pub mod service;

pub use service::{AuthResult, LoginError, UserService};
