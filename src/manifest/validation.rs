//! Manifest validation.
//!
//! Serde handles the syntax; this module checks the declarative contract:
//! - schema version and known builders
//! - valid globs and route patterns
//! - exactly one catch-all route, declared last
//! - every build reachable from some route destination
//!
//! All issues are collected, not just the first.

use std::collections::HashSet;

use super::error::ValidationIssue;
use super::types::Manifest;
use crate::deployment::builds::{compile_glob, normalize_destination};
use crate::routing::pattern::{compile_pattern, is_catch_all};
use crate::routing::template;

/// The only manifest schema version accepted
pub const SUPPORTED_VERSION: u32 = 2;

/// Validate a parsed manifest
pub fn validate(manifest: &Manifest) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if manifest.version != SUPPORTED_VERSION {
        issues.push(ValidationIssue::UnsupportedVersion(manifest.version));
    }

    check_builds(manifest, &mut issues);
    check_routes(manifest, &mut issues);

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_builds(manifest: &Manifest, issues: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();

    // Destinations with placeholders filled, as the build table sees them
    let reachable: Vec<String> = manifest
        .routes
        .iter()
        .filter_map(|r| normalize_destination(&template::sample(&r.dest)))
        .collect();

    for (index, build) in manifest.builds.iter().enumerate() {
        if build.kind().is_none() {
            issues.push(ValidationIssue::UnknownBuilder {
                index,
                builder: build.builder.clone(),
            });
        }

        if !seen.insert(build.src.as_str()) {
            issues.push(ValidationIssue::DuplicateBuild {
                index,
                src: build.src.clone(),
            });
        }

        let glob = match compile_glob(&build.src) {
            Ok(g) => g,
            Err(e) => {
                issues.push(ValidationIssue::InvalidGlob {
                    index,
                    glob: build.src.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !reachable.iter().any(|dest| glob.is_match(dest)) {
            issues.push(ValidationIssue::OrphanBuild {
                index,
                src: build.src.clone(),
            });
        }
    }
}

fn check_routes(manifest: &Manifest, issues: &mut Vec<ValidationIssue>) {
    if manifest.routes.is_empty() {
        issues.push(ValidationIssue::NoRoutes);
        return;
    }

    for (index, route) in manifest.routes.iter().enumerate() {
        if let Err(e) = compile_pattern(&route.src) {
            issues.push(ValidationIssue::InvalidPattern {
                index,
                pattern: route.src.clone(),
                reason: e.to_string(),
            });
        }
    }

    let catch_alls: Vec<usize> = manifest
        .routes
        .iter()
        .enumerate()
        .filter(|(_, r)| is_catch_all(&r.src))
        .map(|(i, _)| i)
        .collect();
    let last = manifest.routes.len() - 1;

    match catch_alls.as_slice() {
        [] => issues.push(ValidationIssue::MissingCatchAll),
        [only] if *only != last => {
            issues.push(ValidationIssue::CatchAllNotLast { index: *only });
        }
        [_] => {}
        many => issues.push(ValidationIssue::MultipleCatchAll {
            indices: many.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{BuildEntry, RouteEntry};

    fn build(src: &str, builder: &str) -> BuildEntry {
        BuildEntry {
            src: src.to_string(),
            builder: builder.to_string(),
        }
    }

    fn route(src: &str, dest: &str) -> RouteEntry {
        RouteEntry {
            src: src.to_string(),
            dest: dest.to_string(),
        }
    }

    fn downloader_manifest() -> Manifest {
        Manifest {
            version: 2,
            builds: vec![
                build("api/backend.py", "@vercel/python"),
                build("public/**/*", "@vercel/static"),
            ],
            routes: vec![
                route("/api/(.*)", "api/backend.py"),
                route("/", "/public/downloader.html"),
                route("/(.*)", "/public/$1"),
            ],
        }
    }

    #[test]
    fn test_downloader_manifest_is_valid() {
        assert_eq!(validate(&downloader_manifest()), Ok(()));
    }

    #[test]
    fn test_unsupported_version() {
        let mut m = downloader_manifest();
        m.version = 1;
        let issues = validate(&m).unwrap_err();
        assert_eq!(issues, vec![ValidationIssue::UnsupportedVersion(1)]);
    }

    #[test]
    fn test_unknown_builder() {
        let mut m = downloader_manifest();
        m.builds[0].builder = "@vercel/ruby".to_string();
        let issues = validate(&m).unwrap_err();
        assert!(issues.contains(&ValidationIssue::UnknownBuilder {
            index: 0,
            builder: "@vercel/ruby".to_string()
        }));
    }

    #[test]
    fn test_empty_routes() {
        let mut m = downloader_manifest();
        m.routes.clear();
        let issues = validate(&m).unwrap_err();
        assert!(issues.contains(&ValidationIssue::NoRoutes));
        // Nothing reaches the builds either
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::OrphanBuild { .. })));
    }

    #[test]
    fn test_catch_all_must_be_last() {
        let mut m = downloader_manifest();
        m.routes.swap(1, 2);
        let issues = validate(&m).unwrap_err();
        assert_eq!(issues, vec![ValidationIssue::CatchAllNotLast { index: 1 }]);
    }

    #[test]
    fn test_missing_catch_all() {
        let mut m = downloader_manifest();
        m.routes.pop();
        m.routes.push(route("/(.+)\\.css", "/public/$1.css"));
        let issues = validate(&m).unwrap_err();
        assert_eq!(issues, vec![ValidationIssue::MissingCatchAll]);
    }

    #[test]
    fn test_multiple_catch_all() {
        let mut m = downloader_manifest();
        m.routes.push(route(".*", "/public/404.html"));
        let issues = validate(&m).unwrap_err();
        assert_eq!(
            issues,
            vec![ValidationIssue::MultipleCatchAll {
                indices: vec![2, 3]
            }]
        );
    }

    #[test]
    fn test_orphan_build() {
        let mut m = downloader_manifest();
        m.builds.push(build("worker/job.py", "@vercel/python"));
        let issues = validate(&m).unwrap_err();
        assert_eq!(
            issues,
            vec![ValidationIssue::OrphanBuild {
                index: 2,
                src: "worker/job.py".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_build() {
        let mut m = downloader_manifest();
        m.builds.push(build("public/**/*", "@vercel/static"));
        let issues = validate(&m).unwrap_err();
        assert!(issues.contains(&ValidationIssue::DuplicateBuild {
            index: 2,
            src: "public/**/*".to_string()
        }));
    }

    #[test]
    fn test_collects_every_issue() {
        let mut m = downloader_manifest();
        m.version = 3;
        m.routes[0].src = "/api/(.*".to_string();
        m.builds[1].builder = "@vercel/go".to_string();
        let issues = validate(&m).unwrap_err();
        assert_eq!(issues.len(), 3);
    }
}
