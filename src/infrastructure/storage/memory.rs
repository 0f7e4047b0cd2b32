//! In-memory user store

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{
    normalize_username, CreateUserDto, DomainResult, UpdateUserDto, User,
    UserRepositoryInterface,
};

/// In-memory user store for development and testing
pub struct InMemoryUserRepository {
    // Sequence number keeps listing in insertion order.
    users: DashMap<Uuid, (u64, User)>,
    sequence: AtomicU64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            sequence: AtomicU64::new(1),
        }
    }

    /// Store a fully formed record as-is, e.g. to seed fixtures.
    pub fn put(&self, user: User) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.users.insert(user.id, (seq, user));
    }

    fn collect(&self, include_deleted: bool) -> Vec<User> {
        let mut rows: Vec<(u64, User)> = self
            .users
            .iter()
            .filter(|entry| include_deleted || !entry.value().1.is_deleted())
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, user)| user).collect()
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepositoryInterface for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .get(&id)
            .map(|entry| entry.value().1.clone())
            .filter(|user| !user.is_deleted()))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let wanted = normalize_username(username);
        Ok(self
            .collect(false)
            .into_iter()
            .find(|user| user.username.to_lowercase() == wanted))
    }

    async fn insert(&self, dto: CreateUserDto) -> DomainResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name: dto.first_name,
            last_name: dto.last_name,
            username: normalize_username(&dto.username),
            password: dto.password,
            role: dto.role,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.put(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let Some(mut entry) = self.users.get_mut(&id) else {
            return Ok(None);
        };
        let user = &mut entry.value_mut().1;
        if user.is_deleted() {
            return Ok(None);
        }

        if let Some(first_name) = dto.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = dto.last_name {
            user.last_name = last_name;
        }
        if let Some(username) = dto.username {
            user.username = normalize_username(&username);
        }
        if let Some(role) = dto.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> DomainResult<bool> {
        let Some(mut entry) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        let user = &mut entry.value_mut().1;
        if user.is_deleted() {
            return Ok(false);
        }
        user.deleted_at = Some(Utc::now());
        Ok(true)
    }

    async fn list_all(&self) -> DomainResult<Vec<User>> {
        Ok(self.collect(false))
    }

    async fn list_all_including_deleted(&self) -> DomainResult<Vec<User>> {
        Ok(self.collect(true))
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(username: &str) -> CreateUserDto {
        CreateUserDto {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            username: username.into(),
            password: "pw".into(),
            role: "member".into(),
        }
    }

    #[tokio::test]
    async fn lists_in_insertion_order_and_hides_deleted() {
        let repo = InMemoryUserRepository::new();
        let a = repo.insert(dto("a")).await.unwrap();
        let b = repo.insert(dto("b")).await.unwrap();
        let c = repo.insert(dto("c")).await.unwrap();

        assert!(repo.soft_delete(b.id).await.unwrap());

        let active: Vec<Uuid> = repo.list_all().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(active, vec![a.id, c.id]);

        let all: Vec<Uuid> = repo
            .list_all_including_deleted()
            .await
            .unwrap()
            .iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(all, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    async fn deleted_user_cannot_be_updated_or_deleted_again() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(dto("dave")).await.unwrap();
        assert!(repo.soft_delete(user.id).await.unwrap());

        assert!(!repo.soft_delete(user.id).await.unwrap());
        assert!(repo
            .update(user.id, UpdateUserDto::default())
            .await
            .unwrap()
            .is_none());
        assert!(repo.find_by_username("dave").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mixed_case_seed_is_found_case_insensitively() {
        let repo = InMemoryUserRepository::new();
        let now = Utc::now();
        repo.put(User {
            id: Uuid::new_v4(),
            first_name: String::new(),
            last_name: String::new(),
            username: "LegacyName".into(),
            password: "pw".into(),
            role: "admin".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });

        assert!(repo.find_by_username("legacyname").await.unwrap().is_some());
    }
}
