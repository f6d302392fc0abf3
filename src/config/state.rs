// Application state module
// Shared by every connection: configuration, current deployment, functions

use std::sync::Arc;
use tokio::sync::RwLock;

use super::types::Config;
use super::ConfigError;
use crate::deployment::Deployment;
use crate::handler::function::FunctionRegistry;
use crate::logger::AccessLog;
use crate::manifest::ManifestError;

/// Application state
pub struct AppState {
    pub config: Config,
    pub functions: FunctionRegistry,
    pub access_log: AccessLog,
    /// Swapped whole on reload; requests keep the snapshot they started with
    deployment: RwLock<Arc<Deployment>>,
}

impl AppState {
    pub fn new(
        config: Config,
        deployment: Deployment,
        functions: FunctionRegistry,
        access_log: AccessLog,
    ) -> Self {
        Self {
            config,
            functions,
            access_log,
            deployment: RwLock::new(Arc::new(deployment)),
        }
    }

    /// Build state from configuration: load the manifest, register functions
    /// and open the access log
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let deployment = load_deployment(&config)?;
        let functions = FunctionRegistry::from_config(&config)?;
        let access_log = AccessLog::open(
            config.logging.access_log_file.as_deref(),
            &config.logging.access_log_format,
        )
        .map_err(|source| ConfigError::Io {
            path: config
                .logging
                .access_log_file
                .clone()
                .unwrap_or_default()
                .into(),
            source,
        })?;

        functions.check_coverage(&deployment);

        Ok(Self::new(config, deployment, functions, access_log))
    }

    /// Current deployment snapshot
    pub async fn deployment(&self) -> Arc<Deployment> {
        Arc::clone(&*self.deployment.read().await)
    }

    /// Re-read the manifest and swap it in. The current deployment is kept
    /// when the new manifest fails to load or validate.
    pub async fn reload(&self) -> Result<Arc<Deployment>, ManifestError> {
        let next = Arc::new(load_deployment(&self.config)?);
        self.functions.check_coverage(&next);
        *self.deployment.write().await = Arc::clone(&next);
        Ok(next)
    }
}

fn load_deployment(config: &Config) -> Result<Deployment, ManifestError> {
    Deployment::load(&config.project.root, &config.project.manifest)
}
