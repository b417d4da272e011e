//! Form validation for record drafts and login credentials
//!
//! Rules mirror the console's entry forms: each field reports at most one
//! message, the first rule it fails.

use std::fmt;

use crate::models::{ContactDraft, DocumentDraft, LoginCredentials};

/// Blood groups accepted by the contact form
pub const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 15;
const MAX_TITLE_LEN: usize = 500;

/// A single failed field rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// All field errors for one form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Form-level validation
pub trait Validate {
    fn field_errors(&self) -> Vec<FieldError>;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// `^\+?[0-9]{1,15}$`
fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (1..=MAX_PHONE_LEN).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

impl Validate for ContactDraft {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        } else if char_len(&self.name) > MAX_NAME_LEN {
            errors.push(FieldError::new("name", "Name is too long"));
        }

        if self.phone.is_empty() {
            errors.push(FieldError::new("phone", "Phone is required"));
        } else if char_len(&self.phone) > MAX_PHONE_LEN {
            errors.push(FieldError::new("phone", "Phone number is too long"));
        } else if !is_valid_phone(&self.phone) {
            errors.push(FieldError::new("phone", "Invalid phone number format"));
        }

        if let Some(group) = self.blood_group.as_deref() {
            if !group.is_empty() && !BLOOD_GROUPS.contains(&group) {
                errors.push(FieldError::new("bloodGroup", "Invalid blood group"));
            }
        }

        if self.lobby.as_deref().map(char_len).unwrap_or(0) > MAX_NAME_LEN {
            errors.push(FieldError::new("lobby", "Lobby is too long"));
        }
        if self.designation.as_deref().map(char_len).unwrap_or(0) > MAX_NAME_LEN {
            errors.push(FieldError::new("designation", "Designation is too long"));
        }

        errors
    }
}

impl Validate for DocumentDraft {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.title.is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        } else if char_len(&self.title) > MAX_TITLE_LEN {
            errors.push(FieldError::new(
                "title",
                "Title must be less than 500 characters",
            ));
        }

        if self.link.is_empty() {
            errors.push(FieldError::new("link", "Link is required"));
        } else if url::Url::parse(&self.link).is_err() {
            errors.push(FieldError::new("link", "Invalid URL format"));
        }

        errors
    }
}

impl Validate for LoginCredentials {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.username.is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        errors
    }
}
