use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_user_agent() -> String {
    format!("rdump/{}", env!("CARGO_PKG_VERSION"))
}

/// Global configuration loaded from `~/.config/rdump/config.toml`.
///
/// Every key is optional in the file; missing keys take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RdumpConfig {
    /// Seconds allowed to establish a connection. Transfers themselves are not
    /// bounded: generating a large backup can take a while.
    pub connect_timeout_secs: u64,
    /// HTTP redirects followed per request.
    pub max_redirections: u32,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Largest `<meta http-equiv="refresh">` delay (seconds) that is followed.
    pub max_refresh_delay_secs: u64,
    /// Meta refreshes followed per navigation.
    pub max_refresh_hops: u32,
    /// Response bytes kept in memory before spilling to a temp file.
    pub spool_threshold_bytes: usize,
}

impl Default for RdumpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            max_redirections: 10,
            user_agent: default_user_agent(),
            max_refresh_delay_secs: 2,
            max_refresh_hops: 5,
            spool_threshold_bytes: 8 * 1024 * 1024,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rdump")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RdumpConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RdumpConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit file. The file must exist.
pub fn load_from(path: &Path) -> Result<RdumpConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: RdumpConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
