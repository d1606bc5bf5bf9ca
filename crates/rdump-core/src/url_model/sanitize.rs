//! Reduce a server-provided name to one safe path component.

/// Longest filename most Unix filesystems accept (NAME_MAX), in bytes.
pub const NAME_MAX: usize = 255;

/// Makes `name` safe to join onto the destination directory.
///
/// - Keeps only the part after the last `/` or `\`
/// - Replaces NUL and other control characters with `_`
/// - Trims surrounding whitespace and leading dots
/// - Truncates to 255 bytes on a char boundary
///
/// Returns an empty string when nothing usable is left.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or("");

    let replaced: String = last
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    let trimmed = replaced.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return String::new();
    }

    let mut take = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}
