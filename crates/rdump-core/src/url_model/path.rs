//! Filename hint from the URL path.

use url::Url;

use super::content_disposition::percent_decode;

/// Last non-empty path segment of `url`, percent-decoded.
///
/// Returns `None` for the root path and for `.`/`..` segments.
pub fn filename_from_url_path(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode(segment);
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return None;
    }
    Some(decoded)
}
