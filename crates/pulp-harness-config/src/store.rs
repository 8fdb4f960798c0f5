// crates/pulp-harness-config/src/store.rs
// ============================================================================
// Module: Configuration Store
// Description: Process-wide cached configuration with explicit reload.
// Purpose: Provide the once-only initialized singleton and its invalidation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The store wraps lazily-initialized shared state behind a mutex: the
//! first [`get_config`] loads the document, later calls return the same
//! `Arc` snapshot, and [`reload`] replaces the snapshot and bumps a
//! generation counter that downstream caches key on.
//! Invariants:
//! - Repeated gets return the identical `Arc` until a reload.
//! - Generations are strictly increasing; snapshots are never mutated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::load::ConfigError;
use crate::model::SystemsConfig;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Interior store state guarded by the mutex.
struct StoreState {
    /// Currently installed snapshot, if any.
    config: Option<Arc<SystemsConfig>>,
    /// Generation of the most recently installed snapshot.
    generation: u64,
}

/// Mutex-guarded configuration cache with once-only initialization.
///
/// The process-wide default store backs [`get_config`] and [`reload`];
/// independent stores can be constructed for tests that exercise multiple
/// configurations.
pub struct ConfigStore {
    /// Guarded store state.
    state: Mutex<StoreState>,
}

impl ConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                config: None,
                generation: 0,
            }),
        }
    }

    /// Returns the cached snapshot, loading it via `loader` on first use.
    ///
    /// # Errors
    ///
    /// Returns the loader's error on first-use failure, or
    /// [`ConfigError::StorePoisoned`] when the lock is poisoned. A failed
    /// load leaves the store empty so a later call can retry.
    pub fn get_with<F>(&self, loader: F) -> Result<Arc<SystemsConfig>, ConfigError>
    where
        F: FnOnce() -> Result<SystemsConfig, ConfigError>,
    {
        let mut state = self.state.lock().map_err(|_| ConfigError::StorePoisoned)?;
        if let Some(config) = &state.config {
            return Ok(Arc::clone(config));
        }
        let config = install(&mut state, loader()?);
        Ok(config)
    }

    /// Replaces the cached snapshot with a freshly loaded one.
    ///
    /// Previously returned snapshots remain valid; subsequent gets observe
    /// the new state.
    ///
    /// # Errors
    ///
    /// Returns the loader's error (the prior snapshot is retained on
    /// failure), or [`ConfigError::StorePoisoned`] when the lock is
    /// poisoned.
    pub fn reload_with<F>(&self, loader: F) -> Result<Arc<SystemsConfig>, ConfigError>
    where
        F: FnOnce() -> Result<SystemsConfig, ConfigError>,
    {
        let loaded = loader()?;
        let mut state = self.state.lock().map_err(|_| ConfigError::StorePoisoned)?;
        let config = install(&mut state, loaded);
        Ok(config)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs a loaded configuration under the next generation.
fn install(state: &mut StoreState, mut loaded: SystemsConfig) -> Arc<SystemsConfig> {
    state.generation = state.generation.saturating_add(1);
    loaded.set_generation(state.generation);
    let config = Arc::new(loaded);
    state.config = Some(Arc::clone(&config));
    tracing::debug!(generation = state.generation, "configuration installed");
    config
}

// ============================================================================
// SECTION: Process-wide Accessors
// ============================================================================

/// Process-wide default store.
static DEFAULT_STORE: ConfigStore = ConfigStore::new();

/// Returns the process-wide configuration, loading it on first call.
///
/// The document is located via `PULP_HARNESS_CONFIG`. Repeated calls return
/// the identical snapshot until [`reload`] is called.
///
/// # Errors
///
/// Returns [`ConfigError`] when the source is missing, malformed, or fails
/// validation.
pub fn get_config() -> Result<Arc<SystemsConfig>, ConfigError> {
    DEFAULT_STORE.get_with(|| SystemsConfig::load(None))
}

/// Re-reads the configuration source and replaces the process-wide snapshot.
///
/// Downstream caches keyed on [`SystemsConfig::generation`] must treat the
/// returned snapshot as a new generation and re-derive their state.
///
/// # Errors
///
/// Returns [`ConfigError`] when the source is missing, malformed, or fails
/// validation; the prior snapshot is retained on failure.
pub fn reload() -> Result<Arc<SystemsConfig>, ConfigError> {
    DEFAULT_STORE.reload_with(|| SystemsConfig::load(None))
}
