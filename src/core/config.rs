//! # Configuration
//!
//! Two TOML layers merged field-by-field: the global file under
//! `~/.config/rbactivate/` provides defaults, the `rbactivate.toml` at the
//! workspace root overrides them. Both layers are optional; so is every
//! field. The merged result is resolved into a [`Settings`] value, including
//! the working directory derived from the dependency manifest.

use crate::constants::{
    COMPOSE_DOCS_URL, DEFAULT_RUBY_EXECUTABLE, WORKSPACE_CONFIG_FILENAME,
};
use crate::core::paths;
use crate::models::{ConfigFile, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration file '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error(
        "The 'version_manager.compose_service' setting must be set when 'compose' is selected \
         as the version manager. See {COMPOSE_DOCS_URL} for setup instructions."
    )]
    MissingComposeService,
    #[error("The compose command '{0}' could not be parsed as a shell invocation.")]
    InvalidComposeCommand(String),
    #[error("Invalid JSON from the compose configuration export: {0}")]
    InvalidComposeConfig(#[source] serde_json::Error),
}

/// Loads and merges both configuration layers for a workspace, resolving the
/// result into session [`Settings`].
pub fn load(workspace_root: &Path) -> Result<Settings, ConfigError> {
    let global = match paths::get_global_config_path() {
        Ok(path) => read_layer(&path)?,
        Err(e) => {
            // No resolvable config dir is not fatal; the workspace layer and
            // built-in defaults still apply.
            log::debug!("Skipping global configuration layer: {e}");
            None
        }
    };

    let workspace = read_layer(&workspace_root.join(WORKSPACE_CONFIG_FILENAME))?;

    Ok(resolve(merge(global, workspace), workspace_root))
}

/// Reads one configuration layer. A missing file is simply an absent layer;
/// an unreadable or unparsable file is an error surfaced to the user.
fn read_layer(path: &Path) -> Result<Option<ConfigFile>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let parsed = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(parsed))
}

/// Merges two layers field-by-field; the workspace layer wins wherever set.
fn merge(global: Option<ConfigFile>, workspace: Option<ConfigFile>) -> ConfigFile {
    let global = global.unwrap_or_default();
    let workspace = workspace.unwrap_or_default();

    ConfigFile {
        manager: workspace.manager.or(global.manager),
        ruby_executable: workspace.ruby_executable.or(global.ruby_executable),
        shell: workspace.shell.or(global.shell),
        bundle_gemfile: workspace.bundle_gemfile.or(global.bundle_gemfile),
        version_manager: crate::models::VersionManagerConfig {
            compose_service: workspace
                .version_manager
                .compose_service
                .or(global.version_manager.compose_service),
            compose_custom_command: workspace
                .version_manager
                .compose_custom_command
                .or(global.version_manager.compose_custom_command),
        },
    }
}

/// Resolves a merged configuration into concrete settings for one session.
fn resolve(config: ConfigFile, workspace_root: &Path) -> Settings {
    Settings {
        manager: config.manager.unwrap_or_default(),
        ruby_executable: config
            .ruby_executable
            .unwrap_or_else(|| DEFAULT_RUBY_EXECUTABLE.to_string()),
        shell: config.shell,
        bundle_dir: resolve_bundle_dir(config.bundle_gemfile.as_deref(), workspace_root),
        compose_service: config.version_manager.compose_service,
        compose_custom_command: config.version_manager.compose_custom_command,
    }
}

/// The working directory for activation commands: the directory containing
/// the configured dependency manifest, or the workspace root when none is
/// configured. Relative manifests are resolved against the workspace root.
fn resolve_bundle_dir(bundle_gemfile: Option<&str>, workspace_root: &Path) -> PathBuf {
    let Some(gemfile) = bundle_gemfile.filter(|value| !value.is_empty()) else {
        return workspace_root.to_path_buf();
    };

    let expanded = PathBuf::from(shellexpand::tilde(gemfile).into_owned());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        workspace_root.join(expanded)
    };

    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| workspace_root.to_path_buf())
}
