//! Database entities module

pub mod user;
