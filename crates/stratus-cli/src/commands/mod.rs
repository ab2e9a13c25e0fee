//! CLI subcommands and shared wiring
//!
//! Adapters (provider, cache) are constructed here, at the dispatch
//! boundary, and passed into the engine - nothing engine-side reaches for
//! process-wide state.

pub mod depth;
pub mod fetch;
pub mod info;
pub mod init;
pub mod pull;
pub mod push;
pub mod remote;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use stratus_cache::{DatabasePool, ListingCache};
use stratus_core::config::Config;
use stratus_core::ports::IRemoteProvider;
use stratus_drive::{DriveClient, DriveProvider};
use stratus_sync::{IgnoreMatcher, SyncState};

/// Loads the configuration from an explicit path or the default location
pub fn load_config(override_path: Option<&str>) -> Config {
    let path = override_path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&path);
    info!(config_path = %path.display(), "Loaded configuration");
    config
}

/// Reads the Drive access token from the environment or the token file
///
/// Token acquisition and refresh live outside stratus; `STRATUS_TOKEN` or
/// `$XDG_CONFIG_HOME/stratus/token` must hold a ready token.
fn load_access_token() -> Result<String> {
    if let Ok(token) = std::env::var("STRATUS_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("stratus")
        .join("token");
    match std::fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => Ok(content.trim().to_string()),
        _ => bail!(
            "no access token found: set STRATUS_TOKEN or write one to {}",
            path.display()
        ),
    }
}

/// Builds the remote provider adapter
pub fn build_provider() -> Result<Arc<dyn IRemoteProvider>> {
    let token = load_access_token()?;
    Ok(Arc::new(DriveProvider::new(DriveClient::new(token))))
}

/// Opens the listing cache over the configured database file
pub async fn open_cache(
    config: &Config,
    provider: Arc<dyn IRemoteProvider>,
) -> Result<ListingCache> {
    let db_path = config.cache_db_path();
    let pool = DatabasePool::new(&db_path)
        .await
        .context("failed to open the cache database")?;
    let cache = ListingCache::open(
        pool.pool().clone(),
        provider,
        Duration::from_secs(config.cache.ttl_secs),
        Duration::from_secs(config.cache.epoch_secs),
    )
    .await
    .context("failed to open the listing cache")?;
    Ok(cache)
}

/// A located sync root with its state and ignore matcher
pub struct Workspace {
    pub state: SyncState,
    pub root: PathBuf,
    pub matcher: IgnoreMatcher,
}

/// Locates the sync root at or above the current directory
pub fn load_workspace(config: &Config) -> Result<Workspace> {
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let (state, root) = SyncState::load(&cwd, config.sync.root_search_depth)?;
    let matcher = IgnoreMatcher::load(&root, &config.sync.auto_ignore);
    Ok(Workspace {
        state,
        root,
        matcher,
    })
}

/// Formats a byte count for `remote` listings
pub fn describe_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", size, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Validates a user-supplied depth value
pub fn validate_depth(value: i64) -> Result<u32, stratus_core::domain::SyncError> {
    if value < 0 {
        return Err(stratus_core::domain::SyncError::InvalidArgument(format!(
            "depth must be non-negative, got {}",
            value
        )));
    }
    u32::try_from(value).map_err(|_| {
        stratus_core::domain::SyncError::InvalidArgument(format!("depth {} is too large", value))
    })
}
