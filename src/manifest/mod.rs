// Manifest module entry point
// Loads, parses and validates the deployment manifest

mod error;
mod types;
pub mod validation;

use std::path::Path;

pub use error::{ManifestError, ValidationIssue};
pub use types::{BuildEntry, BuilderKind, Manifest, RouteEntry};
pub use validation::validate;

impl Manifest {
    /// Parse a manifest from JSON text without semantic checks
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a manifest file without semantic checks
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWNLOADER: &str = r#"{
      "version": 2,
      "builds": [
        { "src": "api/backend.py", "use": "@vercel/python" },
        { "src": "public/**/*", "use": "@vercel/static" }
      ],
      "routes": [
        { "src": "/api/(.*)", "dest": "api/backend.py" },
        { "src": "/", "dest": "/public/downloader.html" },
        { "src": "/(.*)", "dest": "/public/$1" }
      ]
    }"#;

    #[test]
    fn test_parse_keeps_declared_order() {
        let m = Manifest::from_json(DOWNLOADER).unwrap();
        assert_eq!(m.version, 2);
        assert_eq!(m.builds.len(), 2);
        let srcs: Vec<&str> = m.routes.iter().map(|r| r.src.as_str()).collect();
        assert_eq!(srcs, vec!["/api/(.*)", "/", "/(.*)"]);
    }

    #[test]
    fn test_malformed_json() {
        let err = Manifest::from_json(r#"{ "version": 2, "routes": [ }"#).unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Manifest::load(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn test_invalid_manifest_reports_issues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vercel.json");
        std::fs::write(&path, r#"{ "version": 2, "builds": [], "routes": [] }"#).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        let err = ManifestError::Invalid(validate(&manifest).unwrap_err());
        assert_eq!(err.issues(), &[ValidationIssue::NoRoutes]);
        assert!(err.to_string().contains("route list is empty"));
    }
}
