//! `Browser` over a libcurl easy handle.
//!
//! One handle lives for the whole session, so the in-memory cookie engine and
//! open connections carry over between requests. Redirects are followed by
//! libcurl; HTTP error statuses are returned as pages, never as errors. No
//! scripts are executed and no second window is ever opened: every HTML
//! response replaces the top-level page, while attachment responses go to the
//! registered handler and leave the top-level page alone.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::str;
use std::time::Duration;

use curl::easy::Easy;
use tempfile::SpooledTempFile;
use url::Url;

use super::headers::ResponseHeaders;
use super::Browser;
use crate::attachment::{Attachment, AttachmentHandler};
use crate::config::RdumpConfig;
use crate::error::SessionError;
use crate::page::{FormSubmission, Method, Page};
use crate::url_model::suggested_filename;

/// Knobs of a `WebSession`.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub connect_timeout: Duration,
    pub max_redirections: u32,
    pub user_agent: String,
    /// Largest `<meta http-equiv="refresh">` delay that is followed.
    pub max_refresh_delay_secs: u64,
    /// Meta refreshes followed per navigation.
    pub max_refresh_hops: u32,
    /// Response bytes kept in memory before spilling to a temp file.
    pub spool_threshold_bytes: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions::from(&RdumpConfig::default())
    }
}

impl From<&RdumpConfig> for SessionOptions {
    fn from(cfg: &RdumpConfig) -> Self {
        SessionOptions {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            max_redirections: cfg.max_redirections,
            user_agent: cfg.user_agent.clone(),
            max_refresh_delay_secs: cfg.max_refresh_delay_secs,
            max_refresh_hops: cfg.max_refresh_hops,
            spool_threshold_bytes: cfg.spool_threshold_bytes,
        }
    }
}

/// A completed transfer: final URL, status, headers and the spooled body.
struct Response {
    url: Url,
    status: u32,
    headers: ResponseHeaders,
    body: SpooledTempFile,
}

impl Response {
    fn into_page(mut self) -> io::Result<Page> {
        self.body.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        self.body.read_to_end(&mut raw)?;
        let text = String::from_utf8_lossy(&raw);
        Ok(Page::from_response(
            self.url,
            self.status,
            self.headers.content_type.as_deref(),
            &text,
        ))
    }
}

/// Where a response ended up.
enum Outcome {
    /// Replaced the top-level page.
    Shown(Page),
    /// Went to the attachment handler; the top-level page is unchanged.
    Attachment(Page),
}

/// Cookie-keeping HTTP session.
pub struct WebSession {
    easy: Option<Easy>,
    options: SessionOptions,
    handler: Option<Box<dyn AttachmentHandler>>,
    top: Option<Page>,
}

impl WebSession {
    pub fn new(options: SessionOptions) -> Result<Self, SessionError> {
        let mut easy = Easy::new();
        // An empty cookie file enables the in-memory cookie engine.
        easy.cookie_file("").map_err(SessionError::Setup)?;
        easy.follow_location(true).map_err(SessionError::Setup)?;
        easy.max_redirections(options.max_redirections)
            .map_err(SessionError::Setup)?;
        easy.autoreferer(true).map_err(SessionError::Setup)?;
        easy.connect_timeout(options.connect_timeout)
            .map_err(SessionError::Setup)?;
        easy.useragent(&options.user_agent)
            .map_err(SessionError::Setup)?;

        Ok(WebSession {
            easy: Some(easy),
            options,
            handler: None,
            top: None,
        })
    }

    /// Runs one request and buffers the response.
    fn perform(&mut self, url: &Url, post_body: Option<&[u8]>) -> Result<Response, SessionError> {
        let spool_threshold = self.options.spool_threshold_bytes;
        let easy = self.easy.as_mut().ok_or(SessionError::Closed)?;
        let transfer_err = |source: curl::Error| SessionError::Transfer {
            url: url.to_string(),
            source,
        };

        easy.url(url.as_str()).map_err(transfer_err)?;
        match post_body {
            Some(body) => {
                easy.post(true).map_err(transfer_err)?;
                easy.post_fields_copy(body).map_err(transfer_err)?;
            }
            None => easy.get(true).map_err(transfer_err)?,
        }

        let mut lines: Vec<String> = Vec::new();
        let mut body = SpooledTempFile::new(spool_threshold);
        let mut write_error: Option<io::Error> = None;

        let result = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(transfer_err)?;
            transfer
                .write_function(|data| match body.write_all(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        write_error = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(transfer_err)?;
            transfer.perform()
        };

        if let Err(source) = result {
            return Err(match write_error {
                Some(e) => SessionError::Io {
                    url: url.to_string(),
                    source: e,
                },
                None => transfer_err(source),
            });
        }

        let status = easy.response_code().map_err(transfer_err)?;
        let final_url = easy
            .effective_url()
            .map_err(transfer_err)?
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| url.clone());
        let headers = ResponseHeaders::parse(&lines);

        tracing::debug!(
            url = %final_url,
            status,
            content_type = headers.content_type.as_deref().unwrap_or(""),
            "response received"
        );

        Ok(Response {
            url: final_url,
            status,
            headers,
            body,
        })
    }

    /// Routes a response to the attachment handler or into the top-level window.
    fn dispatch(&mut self, response: Response) -> Result<Outcome, SessionError> {
        if response.headers.is_attachment() {
            let page = Page::opaque(
                response.url.clone(),
                response.status,
                response.headers.content_type.as_deref(),
            );
            let name = suggested_filename(
                &response.url,
                response.headers.content_disposition.as_deref(),
            );
            match self.handler.as_mut() {
                Some(handler) => handler.handle_attachment(Attachment::new(
                    name,
                    response.url,
                    response.headers.content_type,
                    Box::new(response.body),
                )),
                None => tracing::debug!(filename = %name, "no attachment handler, dropping download"),
            }
            return Ok(Outcome::Attachment(page));
        }

        let url = response.url.clone();
        let page = response
            .into_page()
            .map_err(|source| SessionError::Io {
                url: url.to_string(),
                source,
            })?;
        self.top = Some(page.clone());
        Ok(Outcome::Shown(page))
    }

    /// Requests `url` and lets the top-level window follow meta refreshes.
    /// Returns the direct response page.
    fn navigate(&mut self, url: &Url, post_body: Option<&[u8]>) -> Result<Page, SessionError> {
        let response = self.perform(url, post_body)?;
        match self.dispatch(response)? {
            Outcome::Attachment(page) => Ok(page),
            Outcome::Shown(page) => {
                self.follow_refresh(&page)?;
                Ok(page)
            }
        }
    }

    fn follow_refresh(&mut self, page: &Page) -> Result<(), SessionError> {
        let mut current = page.clone();
        let mut hops = 0;
        while let Some(refresh) = current.meta_refresh().cloned() {
            if hops >= self.options.max_refresh_hops {
                tracing::debug!(url = %refresh.url, "meta refresh hop limit reached");
                break;
            }
            if refresh.delay_secs > self.options.max_refresh_delay_secs {
                tracing::debug!(
                    url = %refresh.url,
                    delay = refresh.delay_secs,
                    "meta refresh delay too long, staying on page"
                );
                break;
            }
            if refresh.url == *current.url() {
                break;
            }
            hops += 1;
            tracing::debug!(from = %current.url(), to = %refresh.url, "following meta refresh");
            let response = self.perform(&refresh.url, None)?;
            match self.dispatch(response)? {
                Outcome::Shown(next) => current = next,
                Outcome::Attachment(_) => break,
            }
        }
        Ok(())
    }
}

impl Browser for WebSession {
    fn set_attachment_handler(&mut self, handler: Box<dyn AttachmentHandler>) {
        self.handler = Some(handler);
    }

    fn fetch(&mut self, url: &Url) -> Result<Page, SessionError> {
        tracing::debug!(%url, "GET");
        self.navigate(url, None)
    }

    fn submit(&mut self, submission: &FormSubmission) -> Result<Page, SessionError> {
        let target = submission.target_url();
        match submission.method {
            Method::Get => {
                tracing::debug!(url = %target, "submitting form (GET)");
                self.navigate(&target, None)
            }
            Method::Post => {
                tracing::debug!(url = %target, fields = submission.fields.len(), "submitting form (POST)");
                let body = submission.encoded();
                self.navigate(&target, Some(body.as_bytes()))
            }
        }
    }

    fn top_page(&self) -> Option<Page> {
        self.top.clone()
    }

    fn close(&mut self) {
        if self.easy.take().is_some() {
            tracing::debug!("web session closed");
        }
        self.top = None;
        self.handler = None;
    }
}
