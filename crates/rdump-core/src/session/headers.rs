//! Parse raw response header lines collected by the curl header callback.

/// Headers of the final response of a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// `Content-Type` value if present.
    pub content_type: Option<String>,
    /// `Content-Disposition` value if present (attachment marker and filename hint).
    pub content_disposition: Option<String>,
    /// `Content-Length` if present and numeric.
    pub content_length: Option<u64>,
}

impl ResponseHeaders {
    /// Parses header lines as delivered by libcurl.
    ///
    /// When redirects are followed libcurl reports the headers of every hop;
    /// each status line starts a new block and only the last block is kept.
    pub fn parse(lines: &[String]) -> Self {
        let start = lines
            .iter()
            .rposition(|l| l.starts_with("HTTP/"))
            .unwrap_or(0);

        let mut out = ResponseHeaders::default();
        for line in &lines[start..] {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim();
                let value = value.trim();
                if name.eq_ignore_ascii_case("content-type") {
                    out.content_type = Some(value.to_string());
                }
                if name.eq_ignore_ascii_case("content-disposition") {
                    out.content_disposition = Some(value.to_string());
                }
                if name.eq_ignore_ascii_case("content-length") {
                    out.content_length = value.parse::<u64>().ok();
                }
            }
        }
        out
    }

    /// True when the response is a download rather than a page.
    pub fn is_attachment(&self) -> bool {
        self.content_disposition
            .as_deref()
            .is_some_and(crate::url_model::is_attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_content_headers() {
        let h = ResponseHeaders::parse(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Type: application/x-gzip",
            "Content-Length: 17",
            "Content-Disposition: attachment; filename=\"dump.sql.gz\"",
            "",
        ]));
        assert_eq!(h.content_type.as_deref(), Some("application/x-gzip"));
        assert_eq!(h.content_length, Some(17));
        assert!(h.is_attachment());
    }

    #[test]
    fn only_last_response_counts() {
        let h = ResponseHeaders::parse(&lines(&[
            "HTTP/1.1 302 Found",
            "Location: /admin",
            "Content-Disposition: attachment; filename=\"x\"",
            "Content-Type: text/plain",
            "",
            "HTTP/1.1 200 OK",
            "Content-Type: text/html; charset=utf-8",
            "",
        ]));
        assert_eq!(h.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert!(h.content_disposition.is_none());
        assert!(!h.is_attachment());
    }

    #[test]
    fn inline_disposition_is_not_attachment() {
        let h = ResponseHeaders::parse(&lines(&[
            "HTTP/2 200",
            "content-disposition: inline; filename=\"report.html\"",
        ]));
        assert!(!h.is_attachment());
        assert!(h.content_length.is_none());
    }
}
