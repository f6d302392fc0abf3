//! Route matching module
//!
//! Compiles the manifest's ordered route list and resolves request paths
//! against it. Patterns are tested in declared order and the first match
//! determines the destination.

use regex::Regex;

use super::pattern::compile_pattern;
use super::template;
use crate::manifest::{ManifestError, RouteEntry, ValidationIssue};

/// A route entry with its pattern compiled
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    pub src: String,
    pub dest: String,
    regex: Regex,
}

/// Outcome of resolving a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Index of the matching route in declared order
    pub route_index: usize,
    /// Destination with captures substituted
    pub destination: String,
    /// Capture groups 1..n, `None` for groups that did not participate
    pub captures: Vec<Option<String>>,
}

impl Resolution {
    /// Text of the first capture group, if the route has one
    pub fn first_capture(&self) -> Option<&str> {
        self.captures.first().and_then(Option::as_deref)
    }
}

/// Ordered, immutable route table
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile every route, reporting all invalid patterns at once
    pub fn compile(entries: &[RouteEntry]) -> Result<Self, ManifestError> {
        let mut routes = Vec::with_capacity(entries.len());
        let mut issues = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            match compile_pattern(&entry.src) {
                Ok(regex) => routes.push(CompiledRoute {
                    src: entry.src.clone(),
                    dest: entry.dest.clone(),
                    regex,
                }),
                Err(e) => issues.push(ValidationIssue::InvalidPattern {
                    index,
                    pattern: entry.src.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if issues.is_empty() {
            Ok(Self { routes })
        } else {
            Err(ManifestError::Invalid(issues))
        }
    }

    /// Find the first route matching `path` and rewrite it to its destination
    pub fn resolve(&self, path: &str) -> Option<Resolution> {
        self.routes.iter().enumerate().find_map(|(index, route)| {
            let caps = route.regex.captures(path)?;
            Some(Resolution {
                route_index: index,
                destination: template::expand(&route.dest, &caps),
                captures: caps
                    .iter()
                    .skip(1)
                    .map(|m| m.map(|m| m.as_str().to_string()))
                    .collect(),
            })
        })
    }

    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(src: &str, dest: &str) -> RouteEntry {
        RouteEntry {
            src: src.to_string(),
            dest: dest.to_string(),
        }
    }

    fn downloader_table() -> RouteTable {
        RouteTable::compile(&[
            route("/api/(.*)", "api/backend.py"),
            route("/", "/public/downloader.html"),
            route("/(.*)", "/public/$1"),
        ])
        .unwrap()
    }

    #[test]
    fn test_root_resolves_before_catch_all() {
        let res = downloader_table().resolve("/").unwrap();
        assert_eq!(res.route_index, 1);
        assert_eq!(res.destination, "/public/downloader.html");
        assert!(res.captures.is_empty());
    }

    #[test]
    fn test_api_destination_ignores_capture() {
        let res = downloader_table().resolve("/api/anything").unwrap();
        assert_eq!(res.route_index, 0);
        assert_eq!(res.destination, "api/backend.py");
        assert_eq!(res.first_capture(), Some("anything"));
    }

    #[test]
    fn test_catch_all_substitutes_capture() {
        let res = downloader_table().resolve("/style.css").unwrap();
        assert_eq!(res.route_index, 2);
        assert_eq!(res.destination, "/public/style.css");
    }

    #[test]
    fn test_match_route_order() {
        let table = RouteTable::compile(&[
            route("/docs/(.*)", "/first/$1"),
            route("/docs/intro", "/second"),
        ])
        .unwrap();

        // Declared order wins even when a later route is more specific
        let res = table.resolve("/docs/intro").unwrap();
        assert_eq!(res.destination, "/first/intro");
    }

    #[test]
    fn test_no_match() {
        let table = RouteTable::compile(&[route("/only", "/x")]).unwrap();
        assert!(table.resolve("/other").is_none());
    }

    #[test]
    fn test_compile_reports_all_invalid_patterns() {
        let err = RouteTable::compile(&[
            route("/ok", "/ok"),
            route("/bad(", "/x"),
            route("[", "/y"),
        ])
        .unwrap_err();

        let indices: Vec<usize> = err
            .issues()
            .iter()
            .filter_map(|i| match i {
                ValidationIssue::InvalidPattern { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![1, 2]);
    }
}
