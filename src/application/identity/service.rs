//! User management service
//!
//! All user-related business logic lives here.
//! HTTP handlers should be thin wrappers that delegate to this service.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{TokenError, TokenService};
use crate::domain::{
    normalize_username, CreateUserDto, DomainError, DomainResult, UpdateUserDto, User,
    UserRepositoryInterface, ADMIN_ROLE,
};

/// Login failures, each with its own outward status.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Username not found")]
    UserNotFound,

    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("Only admin users are allowed")]
    RoleNotPermitted,

    #[error("Failed to generate token")]
    Signing(#[source] TokenError),

    #[error(transparent)]
    Store(#[from] DomainError),
}

/// Successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

/// Orchestrates login and user-management use-cases.
pub struct UserService {
    repo: Arc<dyn UserRepositoryInterface>,
    tokens: TokenService,
    token_lifetime_seconds: i64,
}

impl UserService {
    pub fn new(
        repo: Arc<dyn UserRepositoryInterface>,
        tokens: TokenService,
        token_lifetime_seconds: i64,
    ) -> Self {
        Self {
            repo,
            tokens,
            token_lifetime_seconds,
        }
    }

    // ── Authentication ──────────────────────────────────────────

    /// Exchange credentials for a bearer token.
    ///
    /// Order matters: unknown user, then password, then role. Only admins
    /// receive a token, and only with the `admin` role claim.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResult, LoginError> {
        let Some(user) = self.repo.find_by_username(username).await? else {
            warn!(username = %username, "Login for unknown username");
            return Err(LoginError::UserNotFound);
        };

        // Plaintext equality, as stored.
        if user.password != password {
            warn!(username = %user.username, "Login with incorrect password");
            return Err(LoginError::InvalidCredentials);
        }

        if !user.is_admin() {
            warn!(username = %user.username, role = %user.role, "Login refused for non-admin role");
            return Err(LoginError::RoleNotPermitted);
        }

        let token = self
            .tokens
            .issue(&user.id.to_string(), [ADMIN_ROLE], self.token_lifetime_seconds)
            .map_err(|e| {
                error!(user_id = %user.id, "Failed to sign token: {}", e);
                LoginError::Signing(e)
            })?;

        info!(user_id = %user.id, username = %user.username, "Admin logged in");
        Ok(AuthResult {
            token,
            expires_in: self.token_lifetime_seconds,
            user,
        })
    }

    // ── Registration ────────────────────────────────────────────

    /// Create a user. The duplicate scan also covers soft-deleted users.
    pub async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let username = normalize_username(&dto.username);
        if username.is_empty() {
            return Err(DomainError::Validation("Username is required".into()));
        }

        let existing = self.repo.list_all_including_deleted().await?;
        if let Some(taken) = existing
            .iter()
            .find(|u| normalize_username(&u.username) == username)
        {
            return Err(DomainError::Conflict(format!(
                "User already exists with username: {}",
                taken.username
            )));
        }

        let user = self.repo.insert(dto).await?;
        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn get_user(&self, id: Uuid) -> DomainResult<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    /// Active users only.
    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        self.repo.list_all().await
    }

    // ── Commands (mutations) ────────────────────────────────────

    pub async fn update_user(&self, id: Uuid, mut dto: UpdateUserDto) -> DomainResult<User> {
        if let Some(username) = dto.username.take() {
            let username = normalize_username(&username);
            if username.is_empty() {
                return Err(DomainError::Validation("Username must not be empty".into()));
            }
            if let Some(other) = self.repo.find_by_username(&username).await? {
                if other.id != id {
                    return Err(DomainError::Conflict(format!(
                        "User already exists with username: {}",
                        other.username
                    )));
                }
            }
            dto.username = Some(username);
        }

        let user = self
            .repo
            .update(id, dto)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Soft delete.
    pub async fn delete_user(&self, id: Uuid) -> DomainResult<()> {
        if !self.repo.soft_delete(id).await? {
            return Err(DomainError::user_not_found(id));
        }
        info!(user_id = %id, "User soft-deleted");
        Ok(())
    }

    pub async fn ping(&self) -> DomainResult<()> {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::infrastructure::InMemoryUserRepository;

    const SECRET: &str = "service-test-secret";

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig::new(SECRET, 600))
    }

    fn new_user(username: &str, password: &str, role: &str) -> CreateUserDto {
        CreateUserDto {
            first_name: "Test".into(),
            last_name: "User".into(),
            username: username.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    async fn service_with(users: &[(&str, &str, &str)]) -> (UserService, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        for (username, password, role) in users {
            repo.insert(new_user(username, password, role)).await.unwrap();
        }
        let service = UserService::new(repo.clone(), tokens(), 600);
        (service, repo)
    }

    #[tokio::test]
    async fn admin_login_issues_admin_token() {
        let (service, _) = service_with(&[("alice", "pw", "admin")]).await;

        let result = service.login("Alice", "pw").await.unwrap();
        assert_eq!(result.expires_in, 600);

        let claims = tokens().validate(&result.token).unwrap();
        assert_eq!(claims.sub, result.user.id.to_string());
        assert_eq!(claims.roles, vec!["admin"]);
        assert_eq!(claims.exp - claims.iat.unwrap(), 600);
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let (service, _) = service_with(&[("alice", "pw", "admin")]).await;
        assert!(matches!(
            service.login("mallory", "pw").await,
            Err(LoginError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn password_is_checked_before_role() {
        let (service, _) = service_with(&[("alice", "pw", "admin"), ("bob", "pw", "member")]).await;

        assert!(matches!(
            service.login("alice", "wrong").await,
            Err(LoginError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("bob", "wrong").await,
            Err(LoginError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("bob", "pw").await,
            Err(LoginError::RoleNotPermitted)
        ));
    }

    #[tokio::test]
    async fn password_comparison_is_exact() {
        let (service, _) = service_with(&[("alice", "Secret", "admin")]).await;
        assert!(matches!(
            service.login("alice", "secret").await,
            Err(LoginError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("alice", "Secret ").await,
            Err(LoginError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn deleted_admin_cannot_log_in() {
        let (service, repo) = service_with(&[("alice", "pw", "admin")]).await;
        let alice = repo.find_by_username("alice").await.unwrap().unwrap();
        service.delete_user(alice.id).await.unwrap();

        assert!(matches!(
            service.login("alice", "pw").await,
            Err(LoginError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn create_rejects_duplicates_including_deleted() {
        let (service, repo) = service_with(&[("alice", "pw", "admin")]).await;

        let err = service.create_user(new_user("ALICE", "x", "member")).await;
        assert!(matches!(err, Err(DomainError::Conflict(_))));

        let alice = repo.find_by_username("alice").await.unwrap().unwrap();
        service.delete_user(alice.id).await.unwrap();

        let err = service.create_user(new_user("alice", "x", "member")).await;
        assert!(matches!(err, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_requires_username() {
        let (service, _) = service_with(&[]).await;
        assert!(matches!(
            service.create_user(new_user("", "x", "member")).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn padded_username_is_a_different_user() {
        let (service, _) = service_with(&[("alice", "pw", "admin")]).await;

        assert!(matches!(
            service.login("  Alice  ", "pw").await,
            Err(LoginError::UserNotFound)
        ));

        let padded = service
            .create_user(new_user(" alice", "x", "member"))
            .await
            .unwrap();
        assert_eq!(padded.username, " alice");
        assert!(matches!(
            service.login(" ALICE", "x").await,
            Err(LoginError::RoleNotPermitted)
        ));
    }

    #[tokio::test]
    async fn update_checks_active_username_collisions() {
        let (service, repo) =
            service_with(&[("alice", "pw", "admin"), ("bob", "pw", "member")]).await;
        let bob = repo.find_by_username("bob").await.unwrap().unwrap();

        let clash = service
            .update_user(
                bob.id,
                UpdateUserDto {
                    username: Some("Alice".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(DomainError::Conflict(_))));

        // Renaming to your own name is fine.
        let same = service
            .update_user(
                bob.id,
                UpdateUserDto {
                    username: Some("BOB".into()),
                    last_name: Some("Builder".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.username, "bob");
        assert_eq!(same.last_name, "Builder");
    }

    #[tokio::test]
    async fn missing_users_are_not_found() {
        let (service, _) = service_with(&[]).await;
        let id = Uuid::new_v4();

        assert!(matches!(
            service.get_user(id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.update_user(id, UpdateUserDto::default()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete_user(id).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
