//! Identifiers of the Drupal pages the flow drives.

/// `id` of the login form on the access-denied page.
pub const LOGIN_FORM_ID: &str = "user-login-form";
pub const LOGIN_USER_FIELD: &str = "name";
pub const LOGIN_PASSWORD_FIELD: &str = "pass";

/// `id` of the Backup and Migrate quick backup form.
pub const BACKUP_FORM_ID: &str = "backup-migrate-ui-manual-quick-backup-form";

/// Select name, option value to pick, and how errors describe the select.
pub const BACKUP_SELECTIONS: [(&str, &str, &str); 3] = [
    ("source_id", "db", "backup source select"),
    ("destination_id", "download", "backup destination select"),
    ("profile_id", "default", "backup settings profile select"),
];

/// Name of the submit control on both forms.
pub const SUBMIT_CONTROL: &str = "op";
