// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Configuration for arbor: engine settings, a storage port and its adapters.
//! Keeps the engine free of process-wide state; callers load a config and pass
//! it down explicitly.

pub mod engine;
pub mod fs;
/// In-memory store.
pub mod memory;
pub mod store;

pub use engine::EngineConfig;
pub use fs::FsConfigStore;
pub use memory::MemoryConfigStore;
pub use store::{ConfigError, ConfigService, ConfigStore};
