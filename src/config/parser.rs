use crate::config::sconf::parse_sconf;
use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Files with the `.sconf` extension are read with the line-oriented legacy
/// grammar; everything else is parsed as TOML.
///
/// # Arguments
///
/// * `path` - Path to the configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use spindle::config::load_config;
///
/// let config = load_config(Path::new("spindle.toml")).unwrap();
/// println!("Actions: {}", config.actions.len());
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;

    let config = if is_sconf(path) {
        parse_sconf(&content)?
    } else {
        toml::from_str(&content)?
    };

    validate(&config)?;

    Ok(config)
}

fn is_sconf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("sconf"))
        .unwrap_or(false)
}

/// Hex-encoded SHA-256 of the raw configuration file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
