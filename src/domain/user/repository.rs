use async_trait::async_trait;
use uuid::Uuid;

use super::{CreateUserDto, UpdateUserDto, User};
use crate::shared::DomainResult;

/// User record store.
///
/// Every lookup except `list_all_including_deleted` ignores soft-deleted users.
#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>>;
    /// Case-insensitive match on username.
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    async fn insert(&self, dto: CreateUserDto) -> DomainResult<User>;
    async fn update(&self, id: Uuid, dto: UpdateUserDto) -> DomainResult<Option<User>>;
    /// Returns `false` when there is no active user with this id.
    async fn soft_delete(&self, id: Uuid) -> DomainResult<bool>;

    async fn list_all(&self) -> DomainResult<Vec<User>>;
    async fn list_all_including_deleted(&self) -> DomainResult<Vec<User>>;

    async fn ping(&self) -> DomainResult<()>;
}
