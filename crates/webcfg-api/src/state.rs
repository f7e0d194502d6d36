//! # Application State
//!
//! Every component a handler needs, built once from [`AppConfig`] and a
//! key-value backend and cloned into each request. There are no globals.

use std::sync::Arc;

use webcfg_core::{PokeTargets, SubdocRegistry};
use webcfg_store::{
    ConfigAggregator, DeviceRootStore, KvBackend, ReferenceStore, SubdocumentLinker,
};
use webcfg_upstream::{TelemetryProfileService, UpstreamError};

use crate::config::AppConfig;

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<SubdocRegistry>,
    pub poke_targets: Arc<PokeTargets>,
    pub references: ReferenceStore,
    pub linker: SubdocumentLinker,
    pub roots: DeviceRootStore,
    pub aggregator: ConfigAggregator,
    pub telemetry: TelemetryProfileService,
}

impl AppState {
    /// Wire every component over `kv`.
    pub fn new(config: &AppConfig, kv: Arc<dyn KvBackend>) -> Result<Self, UpstreamError> {
        let references = ReferenceStore::new(kv.clone());
        let linker = SubdocumentLinker::new(kv.clone(), references.clone());
        let roots = DeviceRootStore::new(kv);
        let telemetry = TelemetryProfileService::new(
            &config.upstream,
            config.telemetry.clone(),
            roots.clone(),
        )?;
        Ok(Self {
            registry: Arc::new(config.registry()),
            poke_targets: Arc::new(config.poke_targets.clone()),
            aggregator: ConfigAggregator::new(linker.clone()),
            references,
            linker,
            roots,
            telemetry,
        })
    }
}
