// Manifest error types

use std::fmt;
use std::path::PathBuf;

/// Error raised while loading or validating a manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid manifest: {}", join_issues(.0))]
    Invalid(Vec<ValidationIssue>),
}

impl ManifestError {
    /// Validation issues, empty for I/O and parse failures
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Invalid(issues) => issues,
            _ => &[],
        }
    }
}

/// A single semantic problem found in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    UnsupportedVersion(u32),
    UnknownBuilder { index: usize, builder: String },
    InvalidGlob { index: usize, glob: String, reason: String },
    DuplicateBuild { index: usize, src: String },
    OrphanBuild { index: usize, src: String },
    InvalidPattern { index: usize, pattern: String, reason: String },
    NoRoutes,
    MissingCatchAll,
    CatchAllNotLast { index: usize },
    MultipleCatchAll { indices: Vec<usize> },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion(v) => write!(f, "unsupported manifest version {v} (expected 2)"),
            Self::UnknownBuilder { index, builder } => {
                write!(f, "builds[{index}]: unknown builder '{builder}'")
            }
            Self::InvalidGlob { index, glob, reason } => {
                write!(f, "builds[{index}]: invalid glob '{glob}': {reason}")
            }
            Self::DuplicateBuild { index, src } => {
                write!(f, "builds[{index}]: source '{src}' is declared twice")
            }
            Self::OrphanBuild { index, src } => {
                write!(f, "builds[{index}]: no route destination reaches '{src}'")
            }
            Self::InvalidPattern { index, pattern, reason } => {
                write!(f, "routes[{index}]: invalid pattern '{pattern}': {reason}")
            }
            Self::NoRoutes => f.write_str("route list is empty"),
            Self::MissingCatchAll => f.write_str("no catch-all route declared"),
            Self::CatchAllNotLast { index } => {
                write!(f, "routes[{index}]: catch-all route must be the final entry")
            }
            Self::MultipleCatchAll { indices } => {
                write!(f, "multiple catch-all routes at indices {indices:?}")
            }
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
