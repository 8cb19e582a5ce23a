//! Form validation glue.

use quill_core::FieldErrors;
use validator::{Validate, ValidationErrors};

/// Flatten `validator` output into per-field messages.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, failures) in errors.field_errors() {
        for failure in failures {
            let message = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({}).", failure.code));
            out.add(field.to_string(), message);
        }
    }
    out
}

/// Run the form's rules.
pub fn check<T: Validate>(form: &T) -> Result<(), FieldErrors> {
    form.validate().map_err(|e| field_errors(&e))
}
