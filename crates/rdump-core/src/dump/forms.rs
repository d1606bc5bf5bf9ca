//! Lookups that turn a missing form or control into the matching `DumpError`.

use crate::error::DumpError;
use crate::page::{Field, FieldKind, Form, Page};

/// Clones the form with `form_id` out of `page`, so it can be filled in.
pub(super) fn locate_form(
    page: &Page,
    form_id: &'static str,
    description: &'static str,
) -> Result<Form, DumpError> {
    page.form_by_id(form_id)
        .cloned()
        .ok_or_else(|| DumpError::FormNotFound {
            description,
            form_id,
            url: page.url().to_string(),
        })
}

/// The field named `name`, provided it is of kind `kind`.
pub(super) fn require_field<'a>(
    form: &'a mut Form,
    form_id: &'static str,
    name: &str,
    kind: FieldKind,
    description: &str,
) -> Result<&'a mut Field, DumpError> {
    match form.field_mut(name) {
        Some(field) if *field.kind() == kind => Ok(field),
        _ => Err(DumpError::FormFieldNotFound {
            description: description.to_string(),
            field: name.to_string(),
            form_id,
        }),
    }
}

/// Checks that a submit-capable control named `name` exists.
pub(super) fn require_submit(
    form: &Form,
    form_id: &'static str,
    name: &str,
    description: &str,
) -> Result<(), DumpError> {
    form.submit_control(name)
        .map(|_| ())
        .ok_or_else(|| DumpError::FormFieldNotFound {
            description: description.to_string(),
            field: name.to_string(),
            form_id,
        })
}
