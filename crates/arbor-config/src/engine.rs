// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted engine settings.

use std::time::Duration;

use arbor_batch::{BatchOptions, BatchOrchestrator};
use arbor_core::{GraphBackend, Skeleton, Units};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{ConfigError, ConfigService, ConfigStore};

/// Settings recognized by the engine.
///
/// Missing fields take their defaults, so `{}` is a valid config. Masks are
/// not stored here; they are per-call arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Physical meaning of coordinates for newly loaded skeletons.
    pub units: Units,
    /// Run batches on worker threads.
    pub parallel: bool,
    /// Worker threads for parallel batches; `0` means one per core.
    pub n_workers: usize,
    /// Collect failed batch items instead of aborting.
    pub omit_failures: bool,
    /// Topology strategy for newly loaded skeletons.
    pub graph_backend: GraphBackend,
    /// Whole-batch deadline in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            units: Units::unitless(),
            parallel: false,
            n_workers: 1,
            omit_failures: false,
            graph_backend: GraphBackend::Reference,
            timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Store key for the engine settings.
    pub const KEY: &'static str = "engine";

    /// Checks values serde cannot: scale range and a non-zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = self.units.scale();
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::Invalid {
                field: "units",
                reason: format!("scale must be finite and positive, got {scale}"),
            });
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "timeout_ms",
                reason: "timeout must be positive; omit it for no deadline".into(),
            });
        }
        Ok(())
    }

    /// The batch deadline.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Batch execution settings.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::from(self)
    }

    /// An orchestrator using these settings.
    pub fn orchestrator(&self) -> BatchOrchestrator {
        BatchOrchestrator::new(self.batch_options())
    }

    /// Stamps units and graph backend onto a skeleton.
    pub fn apply(&self, skeleton: &mut Skeleton) {
        skeleton.set_units(self.units);
        skeleton.set_backend(self.graph_backend);
    }
}

impl From<&EngineConfig> for BatchOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            parallel: config.parallel,
            n_workers: config.n_workers,
            omit_failures: config.omit_failures,
            timeout: config.timeout(),
        }
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Loads and validates the engine settings, defaulting when absent.
    pub fn load_engine(&self) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = self.load_or_default(EngineConfig::KEY)?;
        config.validate()?;
        debug!(?config, "engine config loaded");
        Ok(config)
    }

    /// Validates and saves the engine settings.
    pub fn save_engine(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.save(EngineConfig::KEY, config)
    }
}
