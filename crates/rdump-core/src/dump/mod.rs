//! The dump flow: fetch the backup page, log in if access is denied, press the
//! quick backup button and save whatever file the server hands back.
//!
//! ```text
//! Start -> Fetched -> NeedsAuth -> AuthenticatedPage -+-> FormLocated -> Submitted
//!                  \-> NoAuthNeeded -------------------/
//!   -> AttachmentsCaptured -> Persisted
//! ```
//!
//! Every step fails fast; nothing is retried. The browser is closed on every
//! exit path.

mod backup;
pub mod drupal;
mod forms;
mod login;


use std::path::PathBuf;

use crate::attachment::AttachmentCollector;
use crate::error::DumpError;
use crate::observer::{DumpEvent, DumpObserver, Stage};
use crate::session::{parse_url, Browser, SessionGuard};
use crate::storage;

/// Inputs of one run. `output_dir` must already exist.
#[derive(Debug, Clone, Default)]
pub struct DumpRequest {
    pub url: String,
    pub user: String,
    pub password: String,
    pub output_dir: PathBuf,
}

/// Runs the whole flow on `browser` and returns the saved filenames in
/// capture order.
///
/// Failures are reported to `observer` as `DumpEvent::Failed` before they are
/// returned.
pub fn run<B: Browser>(
    browser: B,
    request: &DumpRequest,
    observer: &dyn DumpObserver,
) -> Result<Vec<String>, DumpError> {
    let result = execute(browser, request, observer);
    if let Err(e) = &result {
        observer.on_event(&DumpEvent::Failed {
            kind: e.kind(),
            message: e.to_string(),
        });
    }
    result
}

fn execute<B: Browser>(
    mut browser: B,
    request: &DumpRequest,
    observer: &dyn DumpObserver,
) -> Result<Vec<String>, DumpError> {
    let stage = |s: Stage| observer.on_event(&DumpEvent::Stage(s));

    // Attachments can arrive on any response, so the collector goes in first.
    let collector = AttachmentCollector::new();
    browser.set_attachment_handler(Box::new(collector.clone()));
    let mut session = SessionGuard::new(browser);
    stage(Stage::Start);

    let url = parse_url(&request.url)?;
    observer.on_event(&DumpEvent::Connecting {
        url: url.to_string(),
    });
    let first = session.fetch(&url)?;
    stage(Stage::Fetched);

    let page = match first.status() {
        403 => {
            stage(Stage::NeedsAuth);
            let page = login::authenticate(
                &mut *session,
                &first,
                &request.user,
                &request.password,
                observer,
            )?;
            stage(Stage::AuthenticatedPage);
            page
        }
        200 => {
            observer.on_event(&DumpEvent::NoLoginRequired);
            stage(Stage::NoAuthNeeded);
            first
        }
        code => {
            return Err(DumpError::connection(format!(
                "connection failed with code {}",
                code
            )))
        }
    };

    backup::trigger_backup(&mut *session, &page, observer)?;

    let attachments = collector.take();
    stage(Stage::AttachmentsCaptured);
    let saved = storage::persist(attachments, &request.output_dir, observer)?;
    stage(Stage::Persisted);
    Ok(saved)
}
