//! The validation gate the form must pass before a chain starts.

use super::form::RegistrationForm;
use crate::error::FieldError;

type FieldAccessor = fn(&RegistrationForm) -> &str;

/// Required text fields: name, accessor, message when blank.
/// Whitespace-only input counts as absent.
const REQUIRED_FIELDS: &[(&str, FieldAccessor, &str)] = &[
    (
        "first_name",
        |form| &form.first_name,
        "First name is required",
    ),
    ("last_name", |form| &form.last_name, "Last name is required"),
    ("company", |form| &form.company, "Company is required"),
];

/// Run every rule against the form and collect the failures.
///
/// An empty result means the form may be submitted.
#[must_use]
pub fn validate(form: &RegistrationForm) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for (field, accessor, message) in REQUIRED_FIELDS {
        if is_blank(accessor(form)) {
            errors.push(FieldError::new(*field, *message));
        }
    }

    if is_blank(&form.email) {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !has_email_shape(&form.email) {
        errors.push(FieldError::new("email", "Enter a valid email address"));
    }

    if form.session_id.is_none() {
        errors.push(FieldError::new("session", "Choose a session"));
    }

    if form.quantity < 1 {
        errors.push(FieldError::new("quantity", "Request at least one seat"));
    }

    errors
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Minimal shape check: one `@` with a non-empty local part and domain.
/// The backend does the real address verification.
fn has_email_shape(email: &str) -> bool {
    email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}
