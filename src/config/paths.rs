//! Configuration file path resolution

use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "CTO_CONFIG";

/// Configuration file read when neither flag nor environment names one
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cluster-templates-operator/config.yaml";

/// Resolve which configuration file to read
///
/// Precedence: explicit path, then `CTO_CONFIG`, then the default location
/// if it exists. `None` means built-in defaults only.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = std::env::var(CONFIG_ENV).ok().filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    default.exists().then_some(default)
}
