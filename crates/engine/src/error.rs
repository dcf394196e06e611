//! The module contains the errors the engine can throw.
//!
//! The errors fall into four groups:
//!
//! - validation: [`Validation`] carries every rejected field at once, nothing
//!   is written.
//! - business rules: [`SameAccount`], [`ArchivedAccount`],
//!   [`ArchivedCategory`] and [`Forbidden`]. The message is meant to be shown
//!   to the user as is.
//! - lookups: [`KeyNotFound`] is returned both for missing rows and for rows
//!   owned by another family.
//! - storage: [`Database`] and [`InvalidData`].
//!
//!  [`Validation`]: EngineError::Validation
//!  [`SameAccount`]: EngineError::SameAccount
//!  [`ArchivedAccount`]: EngineError::ArchivedAccount
//!  [`ArchivedCategory`]: EngineError::ArchivedCategory
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Database`]: EngineError::Database
//!  [`InvalidData`]: EngineError::InvalidData
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// A single rejected field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Field-by-field validation report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends every entry of `other`.
    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    /// Returns `true` if `field` was rejected at least once.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|err| err.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Turns the collected errors into a result.
    pub fn into_result(self) -> Result<(), EngineError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", err.field, err.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("accounts must differ")]
    SameAccount,
    #[error("Archived account: {0}")]
    ArchivedAccount(String),
    #[error("Archived category: {0}")]
    ArchivedCategory(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Shortcut for a validation error on a single field.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::SameAccount, Self::SameAccount) => true,
            (Self::ArchivedAccount(a), Self::ArchivedAccount(b)) => a == b,
            (Self::ArchivedCategory(a), Self::ArchivedCategory(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::InvalidData(a), Self::InvalidData(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
