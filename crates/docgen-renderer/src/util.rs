//! Shared path helpers for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Join path segments with `/` and normalize the result.
///
/// Empty segments and `.` components are dropped and `..` removes the
/// preceding component. A leading `/` on the first non-empty segment is
/// preserved.
///
/// # Examples
///
/// ```
/// use docgen_renderer::join_paths;
///
/// assert_eq!(join_paths(&["./guide", "index.html"]), "guide/index.html");
/// assert_eq!(join_paths(&["", "/a"]), "/a");
/// assert_eq!(join_paths(&["a/b", "../c"]), "a/c");
/// ```
#[must_use]
pub fn join_paths(segments: &[&str]) -> String {
    let absolute = segments
        .iter()
        .find(|s| !s.is_empty())
        .is_some_and(|s| s.starts_with('/'));

    let mut parts: Vec<&str> = Vec::new();
    for component in segments.iter().flat_map(|s| s.split('/')) {
        match component {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_owned()
    } else {
        joined
    }
}

/// Compute a relative URL from one page URL to another (RFC 3986).
///
/// The last segment of `from` is the current document; the base directory
/// is everything before it. Leading slashes are ignored.
///
/// # Examples
///
/// ```
/// use docgen_renderer::relative_path;
///
/// assert_eq!(relative_path("guide/index.html", "api/index.html"), "../api/index.html");
/// assert_eq!(relative_path("index.html", "guide/index.html"), "guide/index.html");
/// ```
#[must_use]
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = if from.ends_with('/') || from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups_part = "../".repeat(from_dir.len() - common);
    let down_part = to_segs[common..].join("/");

    let result = format!("{ups_part}{down_part}");
    if result.is_empty() {
        "./".to_owned()
    } else {
        result
    }
}

/// Whether a link or image reference points outside the site.
pub(crate) fn is_external_url(url: &str) -> bool {
    url.starts_with('/')
        || url.starts_with('#')
        || url.starts_with("//")
        || url.starts_with("data:")
        || url.split_once(':').is_some_and(|(scheme, _)| is_scheme(scheme))
}

fn is_scheme(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths_drops_dot_segments() {
        assert_eq!(join_paths(&[".", "index.html"]), "index.html");
        assert_eq!(join_paths(&["./a/./b", "c.html"]), "a/b/c.html");
    }

    #[test]
    fn test_join_paths_parent_segments() {
        assert_eq!(join_paths(&["a/b", "../../c"]), "c");
        assert_eq!(join_paths(&["a", "../../c"]), "../c");
        assert_eq!(join_paths(&["/a", "../../c"]), "/c");
    }

    #[test]
    fn test_join_paths_empty() {
        assert_eq!(join_paths(&["", ""]), ".");
        assert_eq!(join_paths(&["/"]), "/");
    }

    #[test]
    fn test_relative_path_nested_to_root() {
        assert_eq!(relative_path("guide/index.html", "index.html"), "../index.html");
    }

    #[test]
    fn test_relative_path_siblings() {
        assert_eq!(relative_path("guide/a.html", "guide/b.html"), "b.html");
    }

    #[test]
    fn test_relative_path_ignores_leading_slash() {
        assert_eq!(relative_path("/a", "/b"), "b");
    }

    #[test]
    fn test_relative_path_both_empty() {
        assert_eq!(relative_path("", ""), "./");
    }

    #[test]
    fn test_is_external_url() {
        assert!(is_external_url("https://example.net/a.png"));
        assert!(is_external_url("/static/logo.svg"));
        assert!(is_external_url("data:image/png;base64,AAAA"));
        assert!(is_external_url("mailto:someone@example.net"));
        assert!(!is_external_url("images/diagram.png"));
        assert!(!is_external_url("../shared/logo.svg"));
    }
}
