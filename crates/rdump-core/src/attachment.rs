//! Attachment capture.
//!
//! A session hands every download-type response to its `AttachmentHandler`
//! instead of showing it in a window. `AttachmentCollector` is the handler the
//! dump flow registers: it keeps every attachment of the session lifetime, in
//! the order the server produced them, until persistence drains it.

use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::SpooledTempFile;
use url::Url;

/// Byte source of an attachment. Opening consumes it.
pub trait AttachmentSource: Send {
    fn open(self: Box<Self>) -> io::Result<Box<dyn Read + Send>>;
}

impl AttachmentSource for SpooledTempFile {
    fn open(mut self: Box<Self>) -> io::Result<Box<dyn Read + Send>> {
        self.seek(SeekFrom::Start(0))?;
        Ok(self)
    }
}

impl AttachmentSource for Vec<u8> {
    fn open(self: Box<Self>) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(*self)))
    }
}

/// A downloadable artifact produced by a response.
pub struct Attachment {
    suggested_filename: String,
    url: Url,
    content_type: Option<String>,
    source: Box<dyn AttachmentSource>,
}

impl Attachment {
    pub fn new(
        suggested_filename: impl Into<String>,
        url: Url,
        content_type: Option<String>,
        source: Box<dyn AttachmentSource>,
    ) -> Self {
        Attachment {
            suggested_filename: suggested_filename.into(),
            url,
            content_type,
            source,
        }
    }

    /// Attachment over an in-memory body.
    pub fn from_bytes(suggested_filename: impl Into<String>, url: Url, body: Vec<u8>) -> Self {
        Self::new(suggested_filename, url, None, Box::new(body))
    }

    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Opens the body for reading. The attachment is gone afterwards.
    pub fn open(self) -> io::Result<Box<dyn Read + Send>> {
        self.source.open()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("suggested_filename", &self.suggested_filename)
            .field("url", &self.url.as_str())
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Receives attachments produced by a session.
pub trait AttachmentHandler {
    fn handle_attachment(&mut self, attachment: Attachment);
}

/// Handler that keeps every attachment in arrival order.
///
/// Clones share the same buffer, so the flow keeps one handle and gives another
/// to the session.
#[derive(Clone, Default)]
pub struct AttachmentCollector {
    inner: Arc<Mutex<Vec<Attachment>>>,
}

impl AttachmentCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes and returns everything captured so far, oldest first.
    pub fn take(&self) -> Vec<Attachment> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Attachment>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AttachmentHandler for AttachmentCollector {
    fn handle_attachment(&mut self, attachment: Attachment) {
        tracing::debug!(
            filename = attachment.suggested_filename(),
            url = %attachment.url(),
            "captured attachment"
        );
        self.lock().push(attachment);
    }
}

impl fmt::Debug for AttachmentCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachmentCollector")
            .field("len", &self.len())
            .finish()
    }
}
