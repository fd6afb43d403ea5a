use std::sync::Arc;

use convertino_core::{
    Authenticator, CloudUploader, Config, ConversionEngine, ResultStore, SanitizedConfig,
    SourceRoot,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    engine: ConversionEngine,
    /// Storage proxy client; `None` when `[cloud]` is not configured.
    cloud: Option<Arc<dyn CloudUploader>>,
    /// Where server-local sources may be read from; `None` refuses them.
    source_root: Option<SourceRoot>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        engine: ConversionEngine,
        cloud: Option<Arc<dyn CloudUploader>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            engine,
            cloud,
            source_root: None,
        }
    }

    /// Allows batches of server-local files under `root`.
    pub fn with_source_root(mut self, root: SourceRoot) -> Self {
        self.source_root = Some(root);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        self.engine.store()
    }

    pub fn cloud(&self) -> Option<&Arc<dyn CloudUploader>> {
        self.cloud.as_ref()
    }

    pub fn source_root(&self) -> Option<&SourceRoot> {
        self.source_root.as_ref()
    }
}
