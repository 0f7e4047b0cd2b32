use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, Statement,
};
use uuid::Uuid;

use crate::domain::{
    normalize_username, CreateUserDto, DomainError, DomainResult, UpdateUserDto, User,
    UserRepositoryInterface,
};
use crate::infrastructure::database::entities::user;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_active_model(&self, id: Uuid) -> DomainResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id.to_string())
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> DomainResult<User> {
    let id = Uuid::parse_str(&model.id).map_err(|e| {
        DomainError::Database(format!("stored user id '{}' is not a UUID: {}", model.id, e))
    })?;

    Ok(User {
        id,
        first_name: model.first_name,
        last_name: model.last_name,
        username: model.username,
        password: model.password,
        role: model.role,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    })
}

fn models_to_domain(models: Vec<user::Model>) -> DomainResult<Vec<User>> {
    models.into_iter().map(user_model_to_domain).collect()
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for SeaOrmUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        self.find_active_model(id)
            .await?
            .map(user_model_to_domain)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                    .eq(normalize_username(username)),
            )
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        model.map(user_model_to_domain).transpose()
    }

    async fn insert(&self, dto: CreateUserDto) -> DomainResult<User> {
        let now = Utc::now();

        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            first_name: Set(dto.first_name),
            last_name: Set(dto.last_name),
            username: Set(normalize_username(&dto.username)),
            password: Set(dto.password),
            role: Set(dto.role),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = new_user.insert(&self.db).await?;
        user_model_to_domain(model)
    }

    async fn update(&self, id: Uuid, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let Some(existing) = self.find_active_model(id).await? else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();

        if let Some(first_name) = dto.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = dto.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(username) = dto.username {
            active.username = Set(normalize_username(&username));
        }
        if let Some(role) = dto.role {
            active.role = Set(role);
        }

        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        user_model_to_domain(updated).map(Some)
    }

    async fn soft_delete(&self, id: Uuid) -> DomainResult<bool> {
        let result = user::Entity::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id.to_string()))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn list_all(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find()
            .filter(user::Column::DeletedAt.is_null())
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models_to_domain(models)
    }

    async fn list_all_including_deleted(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models_to_domain(models)
    }

    async fn ping(&self) -> DomainResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::{init_database, DatabaseConfig};
    use sea_orm_migration::MigratorTrait;

    async fn repo() -> SeaOrmUserRepository {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SeaOrmUserRepository::new(db)
    }

    fn dto(username: &str, role: &str) -> CreateUserDto {
        CreateUserDto {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            username: username.into(),
            password: "pw".into(),
            role: role.into(),
        }
    }

    #[tokio::test]
    async fn insert_lowercases_and_finds_case_insensitively() {
        let repo = repo().await;
        let created = repo.insert(dto("Alice", "admin")).await.unwrap();
        assert_eq!(created.username, "alice");

        let found = repo.find_by_username("ALICE").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password, "pw");

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_significant() {
        let repo = repo().await;
        let padded = repo.insert(dto(" Dave ", "member")).await.unwrap();
        assert_eq!(padded.username, " dave ");

        assert!(repo.find_by_username("dave").await.unwrap().is_none());
        let found = repo.find_by_username(" DAVE ").await.unwrap().unwrap();
        assert_eq!(found.id, padded.id);
    }

    #[tokio::test]
    async fn soft_deleted_users_disappear_from_lookups() {
        let repo = repo().await;
        let created = repo.insert(dto("bob", "member")).await.unwrap();

        assert!(repo.soft_delete(created.id).await.unwrap());
        assert!(!repo.soft_delete(created.id).await.unwrap());

        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
        assert!(repo.list_all().await.unwrap().is_empty());

        let everyone = repo.list_all_including_deleted().await.unwrap();
        assert_eq!(everyone.len(), 1);
        assert!(everyone[0].is_deleted());
    }

    #[tokio::test]
    async fn update_applies_only_given_fields() {
        let repo = repo().await;
        let created = repo.insert(dto("carol", "member")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                UpdateUserDto {
                    username: Some("Caroline".into()),
                    role: Some("admin".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.username, "caroline");
        assert_eq!(updated.role, "admin");
        assert_eq!(updated.first_name, "Ada");
        assert!(updated.updated_at >= created.updated_at);

        assert!(repo
            .update(Uuid::new_v4(), UpdateUserDto::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_pool() {
        repo().await.ping().await.unwrap();
    }
}
