//! Application service: configuration use-cases.

use anyhow::Result;
use tracing::info;

use crate::application::ports::ConfigStore;
use crate::domain::SsmConfig;
use crate::domain::config::ConfigUpdate;

/// Load configuration.
pub fn load_config(store: &impl ConfigStore) -> Result<SsmConfig> {
    store.load()
}

/// Apply `update` to the stored configuration and persist it.
///
/// Returns the saved configuration. An empty update still writes the file,
/// so a fresh client ends up with a config holding defaults.
///
/// # Errors
///
/// Returns a validation error from the update, or an I/O error from the store.
pub fn update_config(store: &impl ConfigStore, update: ConfigUpdate) -> Result<SsmConfig> {
    let mut config = store.load()?;
    update.apply(&mut config)?;
    store.save(&config)?;
    info!(path = %store.path().display(), "configuration saved");
    Ok(config)
}
