//! # Compose Invocations
//!
//! Everything the compose variant knows about its orchestration tool: the
//! one-off `run` invocation shape, the `config --format=json` export, and
//! the quoting needed to smuggle an arbitrary command line through `run` as
//! a single program invocation inside the container.

use crate::constants::DEFAULT_COMPOSE_COMMAND;
use crate::core::config::ConfigError;
use crate::models::{ComposeProjectConfig, ComposeVolume, ShellCommand};

/// Compose-specific settings, extracted from the merged configuration.
#[derive(Debug, Clone)]
pub struct ComposeSettings {
    service: Option<String>,
    custom_command: Option<String>,
}

impl ComposeSettings {
    pub fn new(service: Option<String>, custom_command: Option<String>) -> Self {
        Self {
            service,
            custom_command,
        }
    }

    /// The configured target service. Absence is a configuration error,
    /// raised before any process is spawned.
    pub fn service(&self) -> Result<&str, ConfigError> {
        self.service
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingComposeService)
    }

    /// The orchestration tool invocation prefix: the user's override, or
    /// `docker compose --progress quiet`.
    pub fn compose_command(&self) -> &str {
        self.custom_command
            .as_deref()
            .filter(|command| !command.is_empty())
            .unwrap_or(DEFAULT_COMPOSE_COMMAND)
    }

    /// The "run a one-off command in a service" prefix: removes the container
    /// afterward, skips dependent services, allocates no TTY, attaches stdin.
    pub fn run_command(&self) -> String {
        format!("{} run --rm -i --no-deps", self.compose_command())
    }

    /// The full run prefix including the target service.
    pub fn run_invocation(&self) -> Result<String, ConfigError> {
        Ok(format!("{} {}", self.run_command(), self.service()?))
    }

    /// Wraps an arbitrary command line so it executes inside the service.
    pub fn wrap_command(&self, command: &str) -> Result<String, ConfigError> {
        Ok(format!("{} {}", self.run_invocation()?, command))
    }

    /// The `config --format=json` invocation used to read resolved mounts.
    pub fn config_export_command(&self) -> String {
        format!("{} config --format=json", self.compose_command())
    }

    /// Builds the concrete invocation a host process would spawn to run
    /// `command` inside the service: the run invocation's tokens followed by
    /// the user's command shell-escaped as a single argument. `run` treats
    /// the remainder of its argument list as one program invocation inside
    /// the container, and arbitrary commands may themselves contain spaces
    /// or quoting.
    pub fn build_executable(&self, command: &[String]) -> Result<ShellCommand, ConfigError> {
        let invocation = self.run_invocation()?;
        let tokens = shlex::split(&invocation)
            .filter(|tokens| !tokens.is_empty())
            .ok_or_else(|| ConfigError::InvalidComposeCommand(invocation.clone()))?;

        let mut tokens = tokens.into_iter();
        let program = tokens
            .next()
            .ok_or_else(|| ConfigError::InvalidComposeCommand(invocation.clone()))?;
        let mut args: Vec<String> = tokens.collect();
        args.push(shell_escape(&command.join(" ")));

        Ok(ShellCommand {
            command: program,
            args,
        })
    }

    /// Extracts the raw `local -> container` bind mounts declared for the
    /// configured service from a `config --format=json` export.
    pub fn bind_mounts(&self, raw_config: &str) -> Result<Vec<(String, String)>, ConfigError> {
        let service = self.service()?;
        let parsed: ComposeProjectConfig = serde_json::from_str(raw_config).map_err(|e| {
            log::error!("Tried parsing invalid compose config JSON: {raw_config}");
            ConfigError::InvalidComposeConfig(e)
        })?;

        let Some(definition) = parsed.services.get(service) else {
            log::debug!("Service '{service}' not present in compose config output.");
            return Ok(Vec::new());
        };

        Ok(definition
            .volumes
            .iter()
            .filter_map(ComposeVolume::bind_mapping)
            .collect())
    }
}

/// Escapes a command line for use as one POSIX shell word: wrap in single
/// quotes, closing and reopening around each embedded single quote.
pub fn shell_escape(command: &str) -> String {
    format!("'{}'", command.replace('\'', r"'\''"))
}
