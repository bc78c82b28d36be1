use std::collections::HashMap;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// JWT claims carried by access and refresh tokens.
///
/// Standard RFC 7519 claims plus custom fields via the `extra` map.
/// Every issued token gets a fresh `jti`, so two tokens minted for the same
/// subject within the same second are still distinct strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Claims {
    /// Subject (user identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// JWT ID (unique token identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Additional custom fields (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create claims for a subject expiring `ttl_secs` seconds from now.
    ///
    /// # Arguments
    /// * `subject` - Unique user identifier
    /// * `ttl_secs` - Seconds until the token expires
    ///
    /// # Returns
    /// Claims with sub, exp, iat and a random jti set
    pub fn for_subject(subject: impl ToString, ttl_secs: i64) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::seconds(ttl_secs);

        Self {
            sub: Some(subject.to_string()),
            exp: Some(expiration.timestamp()),
            iat: Some(now.timestamp()),
            jti: Some(Uuid::new_v4().to_string()),
            extra: HashMap::new(),
        }
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Add a custom field.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), json_value);
        }
        self
    }

    /// Subject claim as a string slice.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref()
    }
}
