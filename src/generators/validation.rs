//! Input validation for invoice requests.
//!
//! Errors carry the offending field and, where useful, a hint for fixing it.
//! They are reported to clients in a single message listing every problem.

use std::fmt;

use super::common::derive_file_name;

/// Longest file name most filesystems accept, in bytes.
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// Validation error with a field reference and an optional suggestion.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Create error for empty required field
    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} must not be empty", label))
            .with_suggestion(format!("Provide the {}", label.to_lowercase()))
    }

    /// Create error for a name that would escape the storage directory
    pub fn unsafe_path(field: &str, label: &str) -> Self {
        Self::new(
            field,
            format!("{} must not contain path separators or be '.' or '..'", label),
        )
        .with_suggestion("Remove '/', '\\' and NUL characters from the name")
    }

    /// Create error for a derived file name over the filesystem limit
    pub fn file_name_too_long(length: usize) -> Self {
        Self::new(
            "seller, buyer",
            format!(
                "derived file name is {} bytes, the limit is {}",
                length, MAX_FILE_NAME_BYTES
            ),
        )
        .with_suggestion("Shorten the seller or buyer name")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors with formatted output.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Ok if no errors were collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s)", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "; {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Validate that a party name is usable as part of a file name.
pub fn validate_path_safe(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    let has_separator = value.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if has_separator || value == "." || value == ".." {
        errors.add(ValidationError::unsafe_path(field, label));
    }
}

/// Validate a seller/buyer pair the way both HTTP routes need it.
pub fn validate_parties(seller: &str, buyer: &str, errors: &mut ValidationErrors) {
    validate_required(seller, "seller", "Seller", errors);
    validate_path_safe(seller, "seller", "Seller", errors);
    validate_required(buyer, "buyer", "Buyer", errors);
    validate_path_safe(buyer, "buyer", "Buyer", errors);

    let length = derive_file_name(seller, buyer).len();
    if length > MAX_FILE_NAME_BYTES {
        errors.add(ValidationError::file_name_too_long(length));
    }
}
