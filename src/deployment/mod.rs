//! Deployment snapshot
//!
//! A validated manifest compiled into a route table and a build table, bound
//! to the project directory it was loaded from. A snapshot never changes;
//! reloading builds a new one and swaps it in whole.

pub mod builds;

use std::path::{Path, PathBuf};

use crate::manifest::{validate, BuilderKind, Manifest, ManifestError};
use crate::routing::RouteTable;
use builds::{normalize_destination, BuildTable};

/// Where a request path ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Serve a file of the static build
    Static {
        route_index: usize,
        /// Project-relative path, may end with `/` for directories
        relative: String,
    },
    /// Invoke the function registered for a Python build
    Function {
        route_index: usize,
        build_src: String,
        /// Path the function sees after rewriting
        function_path: String,
    },
    /// A route matched but no build owns its destination
    Unowned { route_index: usize, destination: String },
    /// The destination tried to leave the project root
    Refused { route_index: usize, destination: String },
    /// No route matched
    NoRoute,
}

impl Dispatch {
    pub const fn route_index(&self) -> Option<usize> {
        match self {
            Self::Static { route_index, .. }
            | Self::Function { route_index, .. }
            | Self::Unowned { route_index, .. }
            | Self::Refused { route_index, .. } => Some(*route_index),
            Self::NoRoute => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Deployment {
    root: PathBuf,
    manifest: Manifest,
    routes: RouteTable,
    builds: BuildTable,
}

impl Deployment {
    /// Load the manifest from disk; a relative manifest path is taken from `root`
    pub fn load(root: &Path, manifest_path: &Path) -> Result<Self, ManifestError> {
        let path = if manifest_path.is_absolute() {
            manifest_path.to_path_buf()
        } else {
            root.join(manifest_path)
        };
        let manifest = Manifest::load(&path)?;
        Self::from_manifest(root, manifest)
    }

    pub fn from_manifest(root: &Path, manifest: Manifest) -> Result<Self, ManifestError> {
        validate(&manifest).map_err(ManifestError::Invalid)?;
        let routes = RouteTable::compile(&manifest.routes)?;
        let builds = BuildTable::compile(&manifest.builds)?;

        Ok(Self {
            root: root.to_path_buf(),
            manifest,
            routes,
            builds,
        })
    }

    /// Resolve a decoded request path and pick the build that serves it
    pub fn dispatch(&self, path: &str) -> Dispatch {
        let Some(resolution) = self.routes.resolve(path) else {
            return Dispatch::NoRoute;
        };
        let route_index = resolution.route_index;

        let Some(relative) = normalize_destination(&resolution.destination) else {
            return Dispatch::Refused {
                route_index,
                destination: resolution.destination,
            };
        };

        let Some(build) = self.builds.owner(&relative) else {
            return Dispatch::Unowned {
                route_index,
                destination: resolution.destination,
            };
        };

        match build.kind {
            BuilderKind::Static => Dispatch::Static {
                route_index,
                relative,
            },
            BuilderKind::Python => {
                let function_path = resolution.first_capture().map_or_else(
                    || path.to_string(),
                    |capture| format!("/{}", capture.trim_start_matches('/')),
                );
                Dispatch::Function {
                    route_index,
                    build_src: build.src.clone(),
                    function_path,
                }
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub const fn builds(&self) -> &BuildTable {
        &self.builds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment() -> Deployment {
        let manifest = Manifest::from_json(
            r#"{
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
            }"#,
        )
        .unwrap();
        Deployment::from_manifest(Path::new("site"), manifest).unwrap()
    }

    #[test]
    fn test_dispatch_static() {
        assert_eq!(
            deployment().dispatch("/"),
            Dispatch::Static {
                route_index: 1,
                relative: "public/downloader.html".to_string()
            }
        );
        assert_eq!(
            deployment().dispatch("/css/site.css"),
            Dispatch::Static {
                route_index: 2,
                relative: "public/css/site.css".to_string()
            }
        );
    }

    #[test]
    fn test_dispatch_function_path_from_capture() {
        assert_eq!(
            deployment().dispatch("/api/info"),
            Dispatch::Function {
                route_index: 0,
                build_src: "api/backend.py".to_string(),
                function_path: "/info".to_string()
            }
        );
        assert_eq!(
            deployment().dispatch("/api/"),
            Dispatch::Function {
                route_index: 0,
                build_src: "api/backend.py".to_string(),
                function_path: "/".to_string()
            }
        );
    }

    #[test]
    fn test_dispatch_refuses_traversal() {
        let d = deployment().dispatch("/../api/backend.py");
        assert!(matches!(d, Dispatch::Refused { route_index: 2, .. }));
    }

    #[test]
    fn test_dispatch_unowned_destination() {
        let manifest = Manifest::from_json(
            r#"{
              "version": 2,
              "builds": [ { "src": "public/**/*", "use": "@vercel/static" } ],
              "routes": [
                { "src": "/legacy", "dest": "/old/index.html" },
                { "src": "/(.*)", "dest": "/public/$1" }
              ]
            }"#,
        )
        .unwrap();
        let d = Deployment::from_manifest(Path::new("."), manifest).unwrap();
        assert_eq!(
            d.dispatch("/legacy"),
            Dispatch::Unowned {
                route_index: 0,
                destination: "/old/index.html".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_manifest_rejected() {
        let manifest = Manifest::from_json(r#"{ "version": 2, "routes": [] }"#).unwrap();
        assert!(Deployment::from_manifest(Path::new("."), manifest).is_err());
    }
}
