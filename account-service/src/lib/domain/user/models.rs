use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::NameError;
use crate::user::errors::OriginError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::RoleError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// `password_hash` and `meta` are only populated when the record was loaded
/// with [`Projection::Extended`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
    pub active: bool,
    pub roles: Vec<Role>,
    pub origin: Vec<AccountOrigin>,
    pub meta: Option<UserMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user holds `role`, or the administrative role which satisfies any check.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| *r == Role::Admin || *r == role)
    }

    /// Consecutive failed authentications, zero when meta was not loaded.
    pub fn auth_errors(&self) -> u32 {
        self.meta.as_ref().map_or(0, |meta| meta.auth_errors)
    }

    pub fn email_verified(&self) -> bool {
        self.meta.as_ref().map_or(false, |meta| meta.email_verified)
    }

    /// Drop the stored password hash so the user can leave the core safely.
    pub fn without_credentials(mut self) -> Self {
        self.password_hash = None;
        self
    }
}

/// Auth-sensitive user fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMeta {
    pub email_newsletters: bool,
    pub email_verified: bool,
    pub auth_errors: u32,
    /// Reserved for the password reset flow.
    pub secure_token: Option<String>,
    pub secure_token_expires: Option<DateTime<Utc>>,
}

/// Which columns a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Public profile only.
    Slim,
    /// Profile plus password hash and meta.
    Extended,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validated with an RFC 5322 parser and stored lower-cased, so equality is
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated, normalised email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    /// * `MissingDomainSegment` - Domain has no dot (e.g. `john@localhost`)
    pub fn new(email: String) -> Result<Self, EmailError> {
        let email = email.trim().to_lowercase();
        let parsed = email_address::EmailAddress::from_str(&email)
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))?;

        if !parsed.domain().contains('.') {
            return Err(EmailError::MissingDomainSegment);
        }

        Ok(EmailAddress(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// First or last name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName(String);

impl PersonName {
    const MAX_LENGTH: usize = 30;

    /// # Errors
    /// * `Empty` - Blank after trimming
    /// * `TooLong` - More than 30 characters
    pub fn new(name: String) -> Result<Self, NameError> {
        let name = name.trim().to_string();
        let length = name.chars().count();

        if length == 0 {
            Err(NameError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password accepted by the password policy.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 30;

    /// # Errors
    /// * `InvalidLength` - Not 3 to 30 characters
    /// * `InvalidCharacters` - Contains anything but ASCII letters and digits
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&length) {
            return Err(PasswordPolicyError::InvalidLength {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }

        if !password.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PasswordPolicyError::InvalidCharacters);
        }

        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Role tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Editor,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Editor => "editor",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "editor" => Ok(Role::Editor),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            other => Err(RoleError(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an account signs in from. Federated accounts carry no password hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountOrigin {
    Local,
    Google,
}

impl AccountOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountOrigin::Local => "local",
            AccountOrigin::Google => "google",
        }
    }
}

impl FromStr for AccountOrigin {
    type Err = OriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(AccountOrigin::Local),
            "google" => Ok(AccountOrigin::Google),
            other => Err(OriginError(other.to_string())),
        }
    }
}

/// Command to register a new local account
#[derive(Debug)]
pub struct CreateUserCommand {
    pub email: EmailAddress,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub password: Password,
    pub avatar: Option<String>,
    pub email_newsletters: bool,
    pub email_verified: bool,
}

/// Command to update an existing user's profile.
///
/// Only provided fields will be updated.
#[derive(Debug, Default)]
pub struct UpdateUserCommand {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub password: Option<Password>,
    pub email_newsletters: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_roles(roles: Vec<Role>) -> User {
        User {
            id: UserId::new(),
            email: EmailAddress::new("a@b.com".to_string()).unwrap(),
            first_name: PersonName::new("A".to_string()).unwrap(),
            last_name: PersonName::new("B".to_string()).unwrap(),
            password_hash: Some("$argon2id$hash".to_string()),
            avatar: None,
            active: true,
            roles,
            origin: vec![AccountOrigin::Local],
            meta: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_email_is_lowercased() {
        let email = EmailAddress::new(" John@Doe.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "john@doe.com");
        assert_eq!(email, EmailAddress::new("john@doe.com".to_string()).unwrap());
    }

    #[test]
    fn test_email_requires_domain_segments() {
        assert_eq!(
            EmailAddress::new("john@localhost".to_string()),
            Err(EmailError::MissingDomainSegment)
        );
        assert!(matches!(
            EmailAddress::new("not-an-email".to_string()),
            Err(EmailError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_password_policy() {
        assert!(Password::new("abc12345".to_string()).is_ok());
        assert!(matches!(
            Password::new("ab".to_string()),
            Err(PasswordPolicyError::InvalidLength { actual: 2, .. })
        ));
        assert_eq!(
            Password::new("abc 12345".to_string()),
            Err(PasswordPolicyError::InvalidCharacters)
        );
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("abc12345".to_string()).unwrap();
        assert_eq!(format!("{:?}", password), "Password(***)");
    }

    #[test]
    fn test_person_name_bounds() {
        assert_eq!(PersonName::new("  ".to_string()), Err(NameError::Empty));
        assert!(matches!(
            PersonName::new("x".repeat(31)),
            Err(NameError::TooLong { actual: 31, .. })
        ));
        assert_eq!(PersonName::new(" Ada ".to_string()).unwrap().as_str(), "Ada");
    }

    #[test]
    fn test_admin_satisfies_any_role() {
        let admin = user_with_roles(vec![Role::Admin]);
        assert!(admin.has_role(Role::Manager));
        assert!(admin.has_role(Role::User));

        let editor = user_with_roles(vec![Role::Editor]);
        assert!(editor.has_role(Role::Editor));
        assert!(!editor.has_role(Role::Admin));
        assert!(!editor.has_role(Role::Manager));
    }

    #[test]
    fn test_without_credentials_strips_hash() {
        let user = user_with_roles(vec![Role::User]).without_credentials();
        assert!(user.password_hash.is_none());
    }

    #[test]
    fn test_meta_defaults_when_not_loaded() {
        let user = user_with_roles(vec![Role::User]);
        assert_eq!(user.auth_errors(), 0);
        assert!(!user.email_verified());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("root".parse::<Role>().is_err());
    }
}
