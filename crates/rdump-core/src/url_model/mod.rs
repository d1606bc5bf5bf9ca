//! Filenames for captured attachments.
//!
//! The suggested filename comes from the `Content-Disposition` header when it
//! names one, otherwise from the last segment of the response URL. Either way
//! the result is reduced to a single safe path component so that saving it
//! can never leave the destination directory.

mod content_disposition;
mod path;
mod sanitize;

pub use content_disposition::{is_attachment, parse_content_disposition_filename};
pub use path::filename_from_url_path;
pub use sanitize::{sanitize_filename, NAME_MAX};

use url::Url;

/// Used when neither the header nor the URL yields anything usable.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derives the filename an attachment is saved under.
///
/// # Examples
///
/// - `https://example.test/dump.sql.gz`, no header → `"dump.sql.gz"`
/// - any URL, `attachment; filename="site-2024.mysql.gz"` → `"site-2024.mysql.gz"`
/// - `attachment; filename="../../etc/passwd"` → `"passwd"`
pub fn suggested_filename(url: &Url, content_disposition: Option<&str>) -> String {
    let candidate = content_disposition
        .and_then(parse_content_disposition_filename)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty())
        .or_else(|| filename_from_url_path(url).map(|name| sanitize_filename(&name)))
        .filter(|name| !name.is_empty());

    candidate.unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}
