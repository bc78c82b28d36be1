//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for services:
//! - Password hashing (Argon2id, tunable cost)
//! - JWT access/refresh token signing and verification
//! - Single-use refresh token pairing cache with TTL eviction
//!
//! Each service defines its own authentication traits and adapts these implementations.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::with_cost(1024, 1, 1).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! assert!(!hasher.verify("not_my_password", &hash).unwrap());
//! ```
//!
//! ## Access and Refresh Tokens
//! ```
//! use auth::{TokenCodec, TokenSettings};
//!
//! let codec = TokenCodec::new(
//!     &TokenSettings { secret: "access_secret_at_least_32_bytes_long!".into(), expires_in_secs: 900 },
//!     &TokenSettings { secret: "refresh_secret_at_least_32_bytes_long".into(), expires_in_secs: 86400 },
//! )
//! .unwrap();
//!
//! let pair = codec.issue_pair("user123").unwrap();
//! let claims = codec.verify_access(&pair.access_token).unwrap();
//! assert_eq!(claims.subject(), Some("user123"));
//! assert!(codec.verify_access(&pair.refresh_token).is_err());
//! ```
//!
//! ## Refresh Pairing
//! ```
//! use std::time::Duration;
//! use auth::RefreshTokenCache;
//!
//! let cache = RefreshTokenCache::new();
//! cache.put("access", "refresh", Duration::from_secs(60));
//!
//! assert!(cache.redeem("access", "refresh"));
//! assert!(!cache.redeem("access", "refresh"));
//! ```

pub mod jwt;
pub mod password;
pub mod refresh_cache;
pub mod tokens;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use refresh_cache::RefreshTokenCache;
pub use tokens::TokenCodec;
pub use tokens::TokenKind;
pub use tokens::TokenPair;
pub use tokens::TokenSettings;
