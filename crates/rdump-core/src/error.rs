//! Error types for the dump flow and the HTTP session underneath it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single session operation (fetch or submit).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The curl handle could not be configured.
    #[error("failed to set up HTTP session")]
    Setup(#[source] curl::Error),
    /// The session was used after `close`.
    #[error("session already closed")]
    Closed,
    /// The URL could not be parsed.
    #[error("malformed URL: {url}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// The URL parsed but is not http/https.
    #[error("unsupported URL scheme \"{scheme}\" in {url}")]
    UnsupportedScheme { url: String, scheme: String },
    /// libcurl reported an error (DNS, connect, TLS, ...).
    #[error("transfer of {url} failed")]
    Transfer {
        url: String,
        #[source]
        source: curl::Error,
    },
    /// Buffering or reading the response body failed.
    #[error("I/O error while requesting {url}")]
    Io {
        url: String,
        #[source]
        source: io::Error,
    },
}

/// Terminal failure of a dump run. Every step fails fast with one of these.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Malformed URL, I/O failure, or an initial status other than 200/403.
    #[error("{message}")]
    Connection {
        message: String,
        #[source]
        source: Option<SessionError>,
    },
    /// Credentials were submitted but the page after login did not answer 200.
    #[error("login failed - status code {status}")]
    AuthenticationFailed { status: u32 },
    /// The top-level window does not hold an HTML page after login.
    #[error("login returned unexpected page format, expected an HTML page: {detail}")]
    UnexpectedResponse { detail: String },
    #[error("unable to find {description} form (id \"{form_id}\") on {url}")]
    FormNotFound {
        description: &'static str,
        form_id: &'static str,
        url: String,
    },
    /// A required field is missing or is not of the expected kind.
    #[error("unable to find {description} \"{field}\" in form \"{form_id}\"")]
    FormFieldNotFound {
        description: String,
        field: String,
        form_id: &'static str,
    },
    #[error("clicking the backup button did not offer a file to download")]
    NoAttachment,
    #[error("unable to open stream to attachment {filename}")]
    AttachmentRead {
        filename: String,
        #[source]
        source: io::Error,
    },
    #[error("unable to write to file {filename} in {}", path.display())]
    FileWrite {
        path: PathBuf,
        filename: String,
        #[source]
        source: io::Error,
    },
}

impl DumpError {
    pub(crate) fn connection(message: impl Into<String>) -> Self {
        DumpError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DumpError::Connection { .. } => "connection",
            DumpError::AuthenticationFailed { .. } => "authentication-failed",
            DumpError::UnexpectedResponse { .. } => "unexpected-response",
            DumpError::FormNotFound { .. } => "form-not-found",
            DumpError::FormFieldNotFound { .. } => "form-field-not-found",
            DumpError::NoAttachment => "no-attachment",
            DumpError::AttachmentRead { .. } => "attachment-read",
            DumpError::FileWrite { .. } => "file-write",
        }
    }
}

impl From<SessionError> for DumpError {
    fn from(e: SessionError) -> Self {
        let message = match &e {
            SessionError::Setup(source) => format!("error setting up connection: {}", source),
            SessionError::Closed => "error connecting, session already closed".to_string(),
            SessionError::MalformedUrl { url, .. } => {
                format!("error connecting, malformed URL: {}", url)
            }
            SessionError::UnsupportedScheme { url, .. } => {
                format!("error connecting, unsupported URL: {}", url)
            }
            SessionError::Transfer { url, source } => {
                format!("error connecting to {}: {}", url, source)
            }
            SessionError::Io { url, source } => {
                format!("error connecting to {}, I/O error: {}", url, source)
            }
        };
        DumpError::Connection {
            message,
            source: Some(e),
        }
    }
}
