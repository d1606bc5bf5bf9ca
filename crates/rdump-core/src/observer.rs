//! Progress and error reporting hook of the dump flow.
//!
//! The core never configures logging itself; it reports what happens to a
//! `DumpObserver`. `TracingObserver` forwards to `tracing`, closures work as
//! observers too.

use std::fmt;
use std::path::PathBuf;

/// States of a dump run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Fetched,
    NeedsAuth,
    AuthenticatedPage,
    NoAuthNeeded,
    FormLocated,
    Submitted,
    AttachmentsCaptured,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Start => "start",
            Stage::Fetched => "fetched",
            Stage::NeedsAuth => "needs-auth",
            Stage::AuthenticatedPage => "authenticated",
            Stage::NoAuthNeeded => "no-auth-needed",
            Stage::FormLocated => "form-located",
            Stage::Submitted => "submitted",
            Stage::AttachmentsCaptured => "attachments-captured",
            Stage::Persisted => "persisted",
        };
        f.write_str(s)
    }
}

/// Something worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpEvent {
    Stage(Stage),
    Connecting { url: String },
    LoggedIn { url: String, user: String },
    NoLoginRequired,
    BackupSubmitted { url: String, status: u32 },
    MultipleAttachments { count: usize },
    Saving { filename: String },
    Saved { filename: String, bytes: u64, sha256: String },
    /// Releasing a stream failed after the copy; the run goes on.
    CloseFailed { path: PathBuf, error: String },
    Failed { kind: &'static str, message: String },
}

pub trait DumpObserver {
    fn on_event(&self, event: &DumpEvent);
}

impl<F> DumpObserver for F
where
    F: Fn(&DumpEvent),
{
    fn on_event(&self, event: &DumpEvent) {
        self(event)
    }
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DumpObserver for TracingObserver {
    fn on_event(&self, event: &DumpEvent) {
        match event {
            DumpEvent::Stage(stage) => tracing::trace!(%stage, "stage"),
            DumpEvent::Connecting { url } => tracing::info!("connecting to {}", url),
            DumpEvent::LoggedIn { url, user } => {
                tracing::info!("successfully logged in to \"{}\" as \"{}\"", url, user)
            }
            DumpEvent::NoLoginRequired => {
                tracing::info!("no login required, continuing without logging in")
            }
            DumpEvent::BackupSubmitted { url, status } => {
                tracing::debug!(status, "backup form submitted to {}", url)
            }
            DumpEvent::MultipleAttachments { count } => {
                tracing::info!("{} attachments returned, downloading all of them", count)
            }
            DumpEvent::Saving { filename } => tracing::debug!("downloading file {}", filename),
            DumpEvent::Saved {
                filename,
                bytes,
                sha256,
            } => tracing::info!(bytes, sha256 = %sha256, "saved {}", filename),
            DumpEvent::CloseFailed { path, error } => {
                tracing::error!("unable to flush and close {}: {}", path.display(), error)
            }
            DumpEvent::Failed { kind, message } => tracing::error!(kind, "{}", message),
        }
    }
}
