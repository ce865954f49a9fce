//! Field validation rules shared by the registration, user and store endpoints.
//!
//! Every check appends to the same error list so a client sees all of its
//! mistakes in one response.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult, FieldError};

pub const NAME_MIN_CHARS: usize = 20;
pub const NAME_MAX_CHARS: usize = 60;
pub const ADDRESS_MAX_CHARS: usize = 400;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 16;

/// Characters that satisfy the "special character" password rule.
pub const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("Invalid regex"));

/// Collects field errors for one request.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Display names of people and stores: 20 to 60 characters.
    pub fn name(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        let len = value.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
            self.reject(field, message);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if !is_valid_email(value) {
            self.reject(field, message);
        }
        self
    }

    pub fn address(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if value.chars().count() > ADDRESS_MAX_CHARS {
            self.reject(field, message);
        }
        self
    }

    /// Password complexity. Each failed rule is reported separately.
    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        let len = value.chars().count();
        if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
            self.reject(field, "Password must be 8-16 characters");
        }
        if !value.chars().any(|c| c.is_ascii_uppercase()) {
            self.reject(field, "Password must contain at least one uppercase letter");
        }
        if !value.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
            self.reject(field, "Password must contain at least one special character");
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.reject(field, message);
        }
        self
    }

    /// Record an error found by a check that lives outside this type.
    pub fn custom(&mut self, field: &str, message: &str) -> &mut Self {
        self.reject(field, message);
        self
    }

    pub fn finish(&mut self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
