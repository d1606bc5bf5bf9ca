//! Authentication step: fills in the Drupal login form when access is denied.

use super::drupal::{LOGIN_FORM_ID, LOGIN_PASSWORD_FIELD, LOGIN_USER_FIELD, SUBMIT_CONTROL};
use super::forms::{locate_form, require_field, require_submit};
use crate::error::DumpError;
use crate::observer::{DumpEvent, DumpObserver};
use crate::page::{FieldKind, Page};
use crate::session::Browser;

/// Submits `user`/`password` through the login form on `denied` and returns
/// the page the top-level window holds afterwards.
///
/// The direct response to the submit is not used: Drupal may answer with an
/// interstitial that navigates on, so the window's page is read back instead.
pub(super) fn authenticate<B: Browser + ?Sized>(
    browser: &mut B,
    denied: &Page,
    user: &str,
    password: &str,
    observer: &dyn DumpObserver,
) -> Result<Page, DumpError> {
    let mut form = locate_form(denied, LOGIN_FORM_ID, "login")?;
    require_field(
        &mut form,
        LOGIN_FORM_ID,
        LOGIN_USER_FIELD,
        FieldKind::Text,
        "user name text field",
    )?
    .set_value(user);
    require_field(
        &mut form,
        LOGIN_FORM_ID,
        LOGIN_PASSWORD_FIELD,
        FieldKind::Password,
        "password field",
    )?
    .set_value(password);
    require_submit(&form, LOGIN_FORM_ID, SUBMIT_CONTROL, "login submit button")?;

    let submission = form.submission(Some(SUBMIT_CONTROL));
    let direct = browser.submit(&submission)?;
    tracing::debug!(response = %direct, "login form submitted");

    let page = browser
        .top_page()
        .ok_or_else(|| DumpError::UnexpectedResponse {
            detail: "no page loaded after login".to_string(),
        })?;
    if !page.is_html() {
        return Err(DumpError::UnexpectedResponse {
            detail: page.to_string(),
        });
    }
    if page.status() != 200 {
        return Err(DumpError::AuthenticationFailed {
            status: page.status(),
        });
    }

    observer.on_event(&DumpEvent::LoggedIn {
        url: page.url().to_string(),
        user: user.to_string(),
    });
    Ok(page)
}
