use std::fmt::Display;

use super::errors::ApiError;
use super::errors::FieldError;

/// Accumulates field errors while a request body is turned into a command,
/// so one response reports every invalid field.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `<param> is required` when the value is absent.
    pub fn require<T>(&mut self, param: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.0
                .push(FieldError::new(param, format!("{} is required", param)));
        }
        value
    }

    /// Record the validation error under `param`.
    pub fn check<T, E: Display>(&mut self, param: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(FieldError::new(param, e.to_string()));
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_error(self) -> ApiError {
        ApiError::unprocessable(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::errors::ErrorKind;

    #[test]
    fn test_collects_every_failure() {
        let mut errors = FieldErrors::new();

        let missing: Option<String> = errors.require("email", None);
        let bad = errors.check("password", "x".parse::<u32>());
        let good = errors.check("age", "42".parse::<u32>());

        assert!(missing.is_none());
        assert!(bad.is_none());
        assert_eq!(good, Some(42));

        let err = errors.into_error();
        assert_eq!(err.kind(), ErrorKind::Unprocessable);
        assert_eq!(err.data().len(), 2);
        assert_eq!(err.data()[0].param.as_deref(), Some("email"));
        assert_eq!(err.data()[0].message, "email is required");
        assert_eq!(err.data()[1].param.as_deref(), Some("password"));
    }
}
