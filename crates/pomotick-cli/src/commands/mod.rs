pub mod config;
pub mod interval;
pub mod summary;

use pomotick_core::{Backend, Config, IntervalConfig};
use tracing::warn;

/// Load settings and open the configured repository.
pub(crate) fn open_session() -> Result<(Config, IntervalConfig), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    if config.storage.backend == Backend::Memory {
        warn!("in-memory storage: history is lost when this process exits");
    }
    let repo = config.open_repository()?;
    let interval_config = config.interval_config(repo);
    Ok((config, interval_config))
}
