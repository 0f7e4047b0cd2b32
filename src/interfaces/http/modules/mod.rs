//! HTTP API modules, one per resource

pub mod auth;
pub mod health;
pub mod users;
