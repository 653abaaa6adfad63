//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Some(root_folder) = read_config_key("root_folder") {
        return Ok(PathBuf::from(root_folder));
    }

    // Priority 4: OS-dependent compiled default
    Ok(get_default_root_folder())
}

/// Resolve the anonymizer salt.
///
/// Priority: command-line argument, then `MURMUR_ANONYMOUS_SALT`
/// environment variable, then `anonymous_salt` in the TOML config
/// file. The salt is required: without it respondent identities
/// cannot be anonymized, so absence is a configuration error and the
/// caller treats it as fatal at startup.
pub fn resolve_salt(cli_arg: Option<&str>) -> Result<String> {
    if let Some(salt) = cli_arg {
        if !salt.is_empty() {
            return Ok(salt.to_string());
        }
    }

    if let Ok(salt) = std::env::var("MURMUR_ANONYMOUS_SALT") {
        if !salt.is_empty() {
            return Ok(salt);
        }
    }

    if let Some(salt) = read_config_key("anonymous_salt") {
        if !salt.is_empty() {
            return Ok(salt);
        }
    }

    Err(Error::Config(
        "anonymizer salt is not set: pass --salt, set MURMUR_ANONYMOUS_SALT, \
         or add anonymous_salt to the config file"
            .to_string(),
    ))
}

/// Read a single string key from the TOML config file, if present
fn read_config_key(key: &str) -> Option<String> {
    let config_path = load_config_file().ok()?;
    let toml_content = std::fs::read_to_string(&config_path).ok()?;
    let config = toml::from_str::<toml::Value>(&toml_content).ok()?;
    config.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Get default configuration file path for the platform
fn load_config_file() -> Result<PathBuf> {
    let config_dir = if cfg!(target_os = "linux") {
        // Try ~/.config/murmur/config.toml first, then /etc/murmur/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("murmur").join("config.toml"));
        let system_config = PathBuf::from("/etc/murmur/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    } else {
        dirs::config_dir()
            .map(|d| d.join("murmur").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?
    };

    if config_dir.exists() {
        Ok(config_dir)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_dir
        )))
    }
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("murmur"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/murmur"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("murmur"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/murmur"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("murmur"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\murmur"))
    } else {
        PathBuf::from("./murmur_data")
    }
}
