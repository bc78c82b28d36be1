use async_trait::async_trait;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Projection;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new local account.
    ///
    /// # Arguments
    /// * `command` - Validated command containing email, names and password
    ///
    /// # Returns
    /// Created user entity, without its password hash
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Password` - Hashing failed
    /// * `DatabaseError` - Database operation failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError>;

    /// Retrieve user by unique identifier (slim projection).
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Retrieve every user (slim projection).
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_users(&self) -> Result<Vec<User>, UserError>;

    /// Update existing user with optional fields.
    ///
    /// # Returns
    /// Updated user entity, without its password hash
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Password` - Hashing the new password failed
    /// * `DatabaseError` - Database operation failed
    async fn update_user(&self, id: &UserId, command: UpdateUserCommand)
        -> Result<User, UserError>;
}

/// Persistence operations for user aggregate.
///
/// Lookups take a [`Projection`]: `Slim` leaves `password_hash` and `meta`
/// empty, `Extended` loads them for auth-sensitive operations.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(
        &self,
        id: &UserId,
        projection: Projection,
    ) -> Result<Option<User>, UserError>;

    /// Retrieve user by email address (case-insensitive).
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(
        &self,
        email: &EmailAddress,
        projection: Projection,
    ) -> Result<Option<User>, UserError>;

    /// Retrieve all users from storage (slim projection).
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_all(&self) -> Result<Vec<User>, UserError>;

    /// Update profile fields of an existing user.
    ///
    /// `password_hash` and `meta` are only written when present, so a user
    /// loaded with the slim projection can be saved without losing them.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;

    /// Increment `meta.authErrors`, returning the new value.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn record_auth_failure(&self, id: &UserId) -> Result<u32, UserError>;

    /// Reset `meta.authErrors` to zero.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn clear_auth_failures(&self, id: &UserId) -> Result<(), UserError>;
}
