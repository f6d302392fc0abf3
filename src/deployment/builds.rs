//! Build table
//!
//! Decides which declared build owns a resolved destination.

use globset::{GlobBuilder, GlobMatcher};

use crate::manifest::{BuildEntry, BuilderKind, ManifestError, ValidationIssue};

/// A build entry with its source glob compiled
#[derive(Debug, Clone)]
pub struct CompiledBuild {
    pub src: String,
    pub kind: BuilderKind,
    matcher: GlobMatcher,
}

impl CompiledBuild {
    pub fn owns(&self, destination: &str) -> bool {
        self.matcher.is_match(destination)
    }
}

/// Builds in declared order
#[derive(Debug, Clone, Default)]
pub struct BuildTable {
    builds: Vec<CompiledBuild>,
}

impl BuildTable {
    pub fn compile(entries: &[BuildEntry]) -> Result<Self, ManifestError> {
        let mut builds = Vec::with_capacity(entries.len());
        let mut issues = Vec::new();

        for (index, entry) in entries.iter().enumerate() {
            let Some(kind) = entry.kind() else {
                issues.push(ValidationIssue::UnknownBuilder {
                    index,
                    builder: entry.builder.clone(),
                });
                continue;
            };
            match compile_glob(&entry.src) {
                Ok(matcher) => builds.push(CompiledBuild {
                    src: entry.src.clone(),
                    kind,
                    matcher,
                }),
                Err(e) => issues.push(ValidationIssue::InvalidGlob {
                    index,
                    glob: entry.src.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if issues.is_empty() {
            Ok(Self { builds })
        } else {
            Err(ManifestError::Invalid(issues))
        }
    }

    /// First build whose glob matches a normalized destination
    pub fn owner(&self, destination: &str) -> Option<&CompiledBuild> {
        self.builds.iter().find(|b| b.owns(destination))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledBuild> {
        self.builds.iter()
    }
}

/// Compile a build source glob. `*` does not cross `/`, `**` does.
pub fn compile_glob(src: &str) -> Result<GlobMatcher, globset::Error> {
    GlobBuilder::new(src.trim_start_matches('/'))
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
}

/// Turn a destination into a project-relative path.
///
/// Leading slashes, empty and `.` segments are dropped; a trailing slash is
/// kept so directory destinations stay recognizable. Returns `None` when a
/// `..` segment would escape the project root.
pub fn normalize_destination(destination: &str) -> Option<String> {
    let trimmed = destination.trim_start_matches('/');
    let trailing_slash = trimmed.ends_with('/');

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => segments.push(s),
        }
    }

    let mut normalized = segments.join("/");
    if trailing_slash && !normalized.is_empty() {
        normalized.push('/');
    }
    Some(normalized)
}
