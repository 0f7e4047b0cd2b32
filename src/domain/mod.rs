//! Domain layer: records, DTOs and store interfaces

pub mod user;

pub use user::{
    normalize_username, CreateUserDto, UpdateUserDto, User, UserRepositoryInterface, ADMIN_ROLE,
};

pub use crate::shared::{DomainError, DomainResult};
