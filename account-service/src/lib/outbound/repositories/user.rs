use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::AccountOrigin;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::Projection;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserMeta;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const SLIM_COLUMNS: &str =
    "id, email, first_name, last_name, avatar, active, roles, origin, created_at, updated_at";

const EXTENDED_COLUMNS: &str = "id, email, first_name, last_name, avatar, active, roles, origin, \
     created_at, updated_at, password_hash, email_newsletters, email_verified, auth_errors, \
     secure_token, secure_token_expires";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    avatar: Option<String>,
    active: bool,
    roles: Vec<String>,
    origin: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(default)]
    password_hash: Option<String>,
    #[sqlx(default)]
    email_newsletters: Option<bool>,
    #[sqlx(default)]
    email_verified: Option<bool>,
    #[sqlx(default)]
    auth_errors: Option<i32>,
    #[sqlx(default)]
    secure_token: Option<String>,
    #[sqlx(default)]
    secure_token_expires: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self, projection: Projection) -> Result<User, UserError> {
        let roles = self
            .roles
            .iter()
            .map(|role| role.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        let origin = self
            .origin
            .iter()
            .map(|origin| origin.parse::<AccountOrigin>())
            .collect::<Result<Vec<_>, _>>()?;

        let (password_hash, meta) = match projection {
            Projection::Slim => (None, None),
            Projection::Extended => (
                self.password_hash,
                Some(UserMeta {
                    email_newsletters: self.email_newsletters.unwrap_or(false),
                    email_verified: self.email_verified.unwrap_or(false),
                    auth_errors: self.auth_errors.unwrap_or(0).max(0) as u32,
                    secure_token: self.secure_token,
                    secure_token_expires: self.secure_token_expires,
                }),
            ),
        };

        Ok(User {
            id: UserId(self.id),
            email: EmailAddress::new(self.email)?,
            first_name: PersonName::new(self.first_name)?,
            last_name: PersonName::new(self.last_name)?,
            password_hash,
            avatar: self.avatar,
            active: self.active,
            roles,
            origin,
            meta,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn columns(projection: Projection) -> &'static str {
    match projection {
        Projection::Slim => SLIM_COLUMNS,
        Projection::Extended => EXTENDED_COLUMNS,
    }
}

fn role_tags(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|role| role.as_str().to_string()).collect()
}

fn origin_tags(origin: &[AccountOrigin]) -> Vec<String> {
    origin.iter().map(|o| o.as_str().to_string()).collect()
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let meta = user.meta.clone().unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, first_name, last_name, password_hash, avatar, active, roles, origin,
                email_newsletters, email_verified, auth_errors, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.password_hash.as_deref())
        .bind(user.avatar.as_deref())
        .bind(user.active)
        .bind(role_tags(&user.roles))
        .bind(origin_tags(&user.origin))
        .bind(meta.email_newsletters)
        .bind(meta.email_verified)
        .bind(meta.auth_errors as i32)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                    return UserError::EmailAlreadyExists(user.email.as_str().to_string());
                }
            }
            UserError::DatabaseError(e.to_string())
        })?;

        Ok(user)
    }

    async fn find_by_id(
        &self,
        id: &UserId,
        projection: Projection,
    ) -> Result<Option<User>, UserError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", columns(projection));

        sqlx::query_as::<_, UserRow>(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?
            .map(|row| row.into_user(projection))
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
        projection: Projection,
    ) -> Result<Option<User>, UserError> {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            columns(projection)
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?
            .map(|row| row.into_user(projection))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            SLIM_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?
            .into_iter()
            .map(|row| row.into_user(Projection::Slim))
            .collect()
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let meta = user.meta.as_ref();
        let query = format!(
            r#"
            UPDATE users
            SET first_name = $2,
                last_name = $3,
                avatar = $4,
                active = $5,
                roles = $6,
                password_hash = COALESCE($7, password_hash),
                email_newsletters = COALESCE($8, email_newsletters),
                email_verified = COALESCE($9, email_verified),
                updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            EXTENDED_COLUMNS
        );

        sqlx::query_as::<_, UserRow>(&query)
            .bind(user.id.0)
            .bind(user.first_name.as_str())
            .bind(user.last_name.as_str())
            .bind(user.avatar.as_deref())
            .bind(user.active)
            .bind(role_tags(&user.roles))
            .bind(user.password_hash.as_deref())
            .bind(meta.map(|m| m.email_newsletters))
            .bind(meta.map(|m| m.email_verified))
            .bind(user.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?
            .ok_or(UserError::NotFound(user.id.to_string()))?
            .into_user(Projection::Extended)
    }

    async fn record_auth_failure(&self, id: &UserId) -> Result<u32, UserError> {
        let count: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET auth_errors = auth_errors + 1
            WHERE id = $1
            RETURNING auth_errors
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        count
            .map(|c| c.max(0) as u32)
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn clear_auth_failures(&self, id: &UserId) -> Result<(), UserError> {
        sqlx::query("UPDATE users SET auth_errors = 0 WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
