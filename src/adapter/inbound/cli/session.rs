//! Engine setup shared by commands that serve requests.

use std::path::Path;

use tracing::debug;

use super::command::RequestArgs;
use crate::domain::UserId;
use crate::error::Result;
use crate::infrastructure::bootstrap::{self, Components};
use crate::infrastructure::config::Config;

/// Load `path`, or defaults (plus environment overrides) when it is missing.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path)
    } else {
        debug!(path = %path.display(), "Config file not found, using defaults");
        Config::parse_toml("")
    }
}

/// Log level implied by `-v` flags, if any.
#[must_use]
pub const fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Load config, install logging, and wire the engine for a request.
pub fn start(request: &RequestArgs, verbose: u8) -> Result<(Config, Components)> {
    let mut config = load_config(&request.config)?;
    if let Some(catalog) = &request.catalog {
        config.catalog.path = Some(catalog.clone());
    }
    if let Some(level) = verbosity_level(verbose) {
        config.logging.level = level.to_string();
    }
    config.init_logging();

    let components = bootstrap::build(&config)?;
    Ok((config, components))
}

/// Requested user, with blank input treated as anonymous.
#[must_use]
pub fn user_id(request: &RequestArgs) -> Option<UserId> {
    request
        .user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(UserId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request(user: Option<&str>) -> RequestArgs {
        RequestArgs {
            config: PathBuf::from("config.toml"),
            catalog: None,
            user: user.map(str::to_string),
            location: None,
        }
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/sectiond.toml")).unwrap();
        assert_eq!(config.grouping.max_sections, 8);
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(verbosity_level(0), None);
        assert_eq!(verbosity_level(1), Some("debug"));
        assert_eq!(verbosity_level(3), Some("trace"));
    }

    #[test]
    fn blank_user_is_anonymous() {
        assert_eq!(user_id(&request(Some("  "))), None);
        assert_eq!(user_id(&request(Some("u1"))), Some(UserId::new("u1")));
        assert_eq!(user_id(&request(None)), None);
    }
}
