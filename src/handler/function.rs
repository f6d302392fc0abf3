//! Native function runtime
//!
//! Python builds are not executed. Each one is bound by its manifest `src`
//! to a handler compiled into the server.

use async_trait::async_trait;
use hyper::{HeaderMap, Method};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ConfigError};
use crate::deployment::Deployment;
use crate::downloader::{Downloader, YtDlp};
use crate::http::HttpResponse;
use crate::manifest::BuilderKind;

/// Request as seen by a function, after route rewriting
#[derive(Debug, Clone)]
pub struct FunctionRequest {
    pub method: Method,
    /// Function-local path, e.g. `/info`
    pub path: String,
    /// Request path prefix the function answers under, e.g. `/api`; empty
    /// when the route does not rewrite the path
    pub base_path: String,
    /// Raw query string without the leading `?`
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl FunctionRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[async_trait]
pub trait FunctionHandler: Send + Sync {
    async fn invoke(&self, req: FunctionRequest) -> HttpResponse;
}

/// Handlers keyed by the build `src` they stand in for
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    handlers: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every `[[functions]]` binding
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for binding in &config.functions {
            let handler: Arc<dyn FunctionHandler> = match binding.handler.as_str() {
                "downloader" => {
                    let settings = &config.downloader;
                    let tool = YtDlp::new(
                        settings.program.clone(),
                        Duration::from_secs(settings.timeout_secs),
                    );
                    let downloader = Downloader::new(tool, settings.download_dir.clone())
                        .map_err(|source| ConfigError::Io {
                            path: settings.download_dir.clone(),
                            source,
                        })?
                        .with_static_dir(
                            config.project.root.join("public"),
                            config.project.index_files.clone(),
                        );
                    Arc::new(downloader)
                }
                other => {
                    return Err(ConfigError::UnknownHandler {
                        src: binding.src.clone(),
                        handler: other.to_string(),
                    })
                }
            };
            tracing::debug!(src = %binding.src, handler = %binding.handler, "function registered");
            registry.insert(binding.src.clone(), handler);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, src: impl Into<String>, handler: Arc<dyn FunctionHandler>) {
        self.handlers.insert(src.into(), handler);
    }

    #[must_use]
    pub fn with(mut self, src: impl Into<String>, handler: Arc<dyn FunctionHandler>) -> Self {
        self.insert(src, handler);
        self
    }

    pub fn get(&self, src: &str) -> Option<Arc<dyn FunctionHandler>> {
        self.handlers.get(src).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Warn about Python builds that would answer 502. Returns their sources.
    pub fn check_coverage(&self, deployment: &Deployment) -> Vec<String> {
        let missing: Vec<String> = deployment
            .builds()
            .iter()
            .filter(|b| b.kind == BuilderKind::Python && !self.handlers.contains_key(&b.src))
            .map(|b| b.src.clone())
            .collect();
        for src in &missing {
            tracing::warn!(src = %src, "no native handler bound to function build");
        }
        missing
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("sources", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FunctionBinding;
    use crate::http::response;
    use crate::manifest::Manifest;
    use hyper::StatusCode;
    use std::path::Path;

    struct Echo;

    #[async_trait]
    impl FunctionHandler for Echo {
        async fn invoke(&self, req: FunctionRequest) -> HttpResponse {
            response::json(StatusCode::OK, &serde_json::json!({ "path": req.path }))
        }
    }

    fn deployment() -> Deployment {
        let manifest = Manifest::from_json(
            r#"{
              "version": 2,
              "builds": [
                { "src": "api/backend.py", "use": "@vercel/python" },
                { "src": "api/other.py", "use": "@vercel/python" },
                { "src": "public/**/*", "use": "@vercel/static" }
              ],
              "routes": [
                { "src": "/api/(.*)", "dest": "api/backend.py" },
                { "src": "/other", "dest": "api/other.py" },
                { "src": "/(.*)", "dest": "/public/$1" }
              ]
            }"#,
        )
        .unwrap();
        Deployment::from_manifest(Path::new("."), manifest).unwrap()
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let registry = FunctionRegistry::new().with("api/backend.py", Arc::new(Echo));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("api/other.py").is_none());

        let handler = registry.get("api/backend.py").unwrap();
        let resp = handler
            .invoke(FunctionRequest {
                method: Method::GET,
                path: "/info".to_string(),
                base_path: "/api".to_string(),
                query: None,
                headers: HeaderMap::new(),
            })
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_check_coverage_reports_unbound_builds() {
        let registry = FunctionRegistry::new().with("api/backend.py", Arc::new(Echo));
        assert_eq!(registry.check_coverage(&deployment()), vec!["api/other.py"]);
    }

    #[test]
    fn test_from_config_rejects_unknown_handler() {
        let mut config = Config::load_from("no-such-config-file").unwrap();
        config.functions = vec![FunctionBinding {
            src: "api/backend.py".to_string(),
            handler: "lambda".to_string(),
        }];
        assert!(matches!(
            FunctionRegistry::from_config(&config),
            Err(ConfigError::UnknownHandler { .. })
        ));
    }

    #[test]
    fn test_from_config_creates_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from("no-such-config-file").unwrap();
        config.downloader.download_dir = dir.path().join("media");

        let registry = FunctionRegistry::from_config(&config).unwrap();
        assert!(registry.get("api/backend.py").is_some());
        assert!(dir.path().join("media").is_dir());
    }
}
