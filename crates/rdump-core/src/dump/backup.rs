//! Backup-trigger step: picks database, download and default profile, then
//! presses the backup button.

use super::drupal::{BACKUP_FORM_ID, BACKUP_SELECTIONS, SUBMIT_CONTROL};
use super::forms::{locate_form, require_field, require_submit};
use crate::error::DumpError;
use crate::observer::{DumpEvent, DumpObserver, Stage};
use crate::page::{FieldKind, Page};
use crate::session::Browser;

pub(super) fn trigger_backup<B: Browser + ?Sized>(
    browser: &mut B,
    page: &Page,
    observer: &dyn DumpObserver,
) -> Result<(), DumpError> {
    let mut form = locate_form(page, BACKUP_FORM_ID, "backup")?;
    observer.on_event(&DumpEvent::Stage(Stage::FormLocated));

    for (name, value, description) in BACKUP_SELECTIONS {
        let select = require_field(&mut form, BACKUP_FORM_ID, name, FieldKind::Select, description)?;
        if !select.select(value) {
            return Err(DumpError::FormFieldNotFound {
                description: format!("option \"{}\" of {}", value, description),
                field: name.to_string(),
                form_id: BACKUP_FORM_ID,
            });
        }
    }
    require_submit(&form, BACKUP_FORM_ID, SUBMIT_CONTROL, "backup submit button")?;

    let submission = form.submission(Some(SUBMIT_CONTROL));
    let response = browser.submit(&submission)?;
    observer.on_event(&DumpEvent::BackupSubmitted {
        url: response.url().to_string(),
        status: response.status(),
    });
    observer.on_event(&DumpEvent::Stage(Stage::Submitted));
    Ok(())
}
