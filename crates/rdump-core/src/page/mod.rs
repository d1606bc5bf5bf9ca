//! Snapshot of one server response and the forms it carries.
//!
//! A `Page` is produced by every fetch or submit and never changes afterwards.
//! HTML bodies are parsed once, on construction, into `Form` descriptors; the
//! raw markup is not kept.

mod form;
mod parse;

pub use form::{Field, FieldKind, Form, FormSubmission, Method, SelectOption};
pub use parse::MetaRefresh;

use url::Url;

/// One response as seen by the flow: status, final URL, content type and forms.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    status: u32,
    content_type: Option<String>,
    html: bool,
    forms: Vec<Form>,
    refresh: Option<MetaRefresh>,
}

impl Page {
    /// Builds a page from a decoded response body.
    ///
    /// The body is parsed for forms only when the response is HTML (by content
    /// type, or by sniffing the markup when the server sent none).
    pub fn from_response(url: Url, status: u32, content_type: Option<&str>, body: &str) -> Self {
        let html = match content_type {
            Some(ct) => is_html_content_type(ct),
            None => looks_like_html(body),
        };
        let (forms, refresh) = if html {
            let doc = parse::Document::parse(body, &url);
            (doc.forms, doc.refresh)
        } else {
            (Vec::new(), None)
        };
        Page {
            url,
            status,
            content_type: content_type.map(str::to_string),
            html,
            forms,
            refresh,
        }
    }

    /// A non-HTML page (e.g. the response that carried an attachment).
    pub fn opaque(url: Url, status: u32, content_type: Option<&str>) -> Self {
        Page {
            url,
            status,
            content_type: content_type.map(str::to_string),
            html: false,
            forms: Vec::new(),
            refresh: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// True if this page is a navigable HTML document.
    pub fn is_html(&self) -> bool {
        self.html
    }

    /// All forms in document order.
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    /// First form whose `id` attribute equals `id`.
    pub fn form_by_id(&self, id: &str) -> Option<&Form> {
        self.forms.iter().find(|f| f.id() == Some(id))
    }

    /// `<meta http-equiv="refresh">` directive, if the page has one with a target URL.
    pub fn meta_refresh(&self) -> Option<&MetaRefresh> {
        self.refresh.as_ref()
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (HTTP {}, {})",
            self.url,
            self.status,
            self.content_type.as_deref().unwrap_or("no content type")
        )
    }
}

fn is_html_content_type(ct: &str) -> bool {
    let mime = ct.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case("text/html") || mime.eq_ignore_ascii_case("application/xhtml+xml")
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}
