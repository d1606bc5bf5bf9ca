//! Stateful web session behind a small browser-like interface.
//!
//! The dump flow only talks to `Browser`. `WebSession` implements it on top of
//! a libcurl easy handle; tests drive the flow with a fake.

mod headers;
mod web;

pub use headers::ResponseHeaders;
pub use web::{SessionOptions, WebSession};

use url::Url;

use crate::attachment::AttachmentHandler;
use crate::error::SessionError;
use crate::page::{FormSubmission, Page};

/// What the dump flow needs from a browser.
///
/// Implementations must not fail on non-2xx statuses: those come back as a
/// `Page` whose status the caller inspects. Only transport-level problems are
/// errors.
pub trait Browser {
    /// Registers the handler that receives every attachment response of the
    /// session. Must be called before the first navigation.
    fn set_attachment_handler(&mut self, handler: Box<dyn AttachmentHandler>);

    /// Loads `url` into the top-level window and returns the response page.
    fn fetch(&mut self, url: &Url) -> Result<Page, SessionError>;

    /// Sends a form submission and returns the direct response page.
    fn submit(&mut self, submission: &FormSubmission) -> Result<Page, SessionError>;

    /// Page currently enclosed by the top-level window.
    ///
    /// This can differ from the last `submit` result when the response was an
    /// interstitial that navigated on, or an attachment that never replaced
    /// the window content.
    fn top_page(&self) -> Option<Page>;

    /// Releases windows and connections. Safe to call more than once.
    fn close(&mut self);
}

/// Closes the wrapped browser when dropped, whatever path the flow leaves by.
pub struct SessionGuard<B: Browser> {
    browser: B,
}

impl<B: Browser> SessionGuard<B> {
    pub fn new(browser: B) -> Self {
        SessionGuard { browser }
    }
}

impl<B: Browser> std::ops::Deref for SessionGuard<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.browser
    }
}

impl<B: Browser> std::ops::DerefMut for SessionGuard<B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut self.browser
    }
}

impl<B: Browser> Drop for SessionGuard<B> {
    fn drop(&mut self) {
        self.browser.close();
    }
}

/// Parses a user-supplied URL, accepting only http and https.
pub fn parse_url(raw: &str) -> Result<Url, SessionError> {
    let url = Url::parse(raw.trim()).map_err(|source| SessionError::MalformedUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SessionError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: other.to_string(),
        }),
    }
}
