//! Route pattern compilation
//!
//! Route sources are regular expressions that must match the whole request
//! path, so every pattern is wrapped as `^(?:src)$` before compiling.

use regex::Regex;

/// Patterns that match any remaining path once anchors are removed
const CATCH_ALL_FORMS: [&str; 4] = [".*", "(.*)", "/.*", "/(.*)"];

/// Anchor a route source so it matches the full path
pub fn anchor(src: &str) -> String {
    let body = strip_anchors(src);
    format!("^(?:{body})$")
}

/// Compile a route source into an anchored regex
pub fn compile_pattern(src: &str) -> Result<Regex, regex::Error> {
    Regex::new(&anchor(src))
}

/// Whether a route source is a catch-all pattern
pub fn is_catch_all(src: &str) -> bool {
    CATCH_ALL_FORMS.contains(&strip_anchors(src))
}

fn strip_anchors(src: &str) -> &str {
    let src = src.strip_prefix('^').unwrap_or(src);
    src.strip_suffix('$').unwrap_or(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_wraps_whole_path() {
        let re = compile_pattern("/").unwrap();
        assert!(re.is_match("/"));
        assert!(!re.is_match("/style.css"));

        let re = compile_pattern("/api/(.*)").unwrap();
        assert!(re.is_match("/api/info"));
        assert!(!re.is_match("/v2/api/info"));
    }

    #[test]
    fn test_existing_anchors_are_not_doubled() {
        assert_eq!(anchor("^/api/(.*)$"), "^(?:/api/(.*))$");
        assert_eq!(anchor("/"), "^(?:/)$");
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let re = compile_pattern("/a|/b").unwrap();
        assert!(re.is_match("/a"));
        assert!(re.is_match("/b"));
        assert!(!re.is_match("/ab"));
        assert!(!re.is_match("/a/b"));
    }

    #[test]
    fn test_catch_all_detection() {
        assert!(is_catch_all("/(.*)"));
        assert!(is_catch_all("^/(.*)$"));
        assert!(is_catch_all(".*"));
        assert!(!is_catch_all("/api/(.*)"));
        assert!(!is_catch_all("/"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(compile_pattern("/api/(.*").is_err());
    }
}
