//! # Version Manager
//!
//! The strategy core. Each variant knows how to reach the Ruby interpreter
//! in one particular execution context and turn a "run this in the target
//! environment" request into a concrete shell invocation:
//!
//! - **Passthrough**: the interpreter is already reachable on the ambient
//!   PATH (system package manager, pre-activated container, etc.). Commands
//!   run unmodified; activation layers the probe's environment over the
//!   caller-supplied ambient one.
//! - **Compose**: the interpreter lives inside a compose-managed service.
//!   Every command is wrapped in the orchestration tool's one-off `run`
//!   invocation, and host paths can be translated into the service's mount
//!   namespace through a [`PathConverter`].
//!
//! Exactly one variant is active per workspace session, selected from
//! configuration at construction. Instances hold no mutable state, so
//! concurrent `activate()` calls are safe; each performs its own probe.

use crate::core::activation::{self, ActivationError};
use crate::core::compose::ComposeSettings;
use crate::core::config::ConfigError;
use crate::core::path_converter::{PathConverter, PathMapping};
use crate::models::{ActivationResult, ManagerKind, Settings, ShellCommand};
use crate::system::executor::{self, CommandOutput, ExecutionError, RunOptions};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error("No command specified to run.")]
    EmptyCommand,
}

/// The seam between the manager and process execution. Production code uses
/// [`ShellRunner`]; tests substitute a stub so activation logic can be
/// exercised without spawning anything.
pub trait CommandRunner {
    fn run(
        &self,
        command_line: &str,
        options: &RunOptions,
    ) -> impl Future<Output = Result<CommandOutput, ExecutionError>>;
}

/// Runs commands through [`executor::run_shell_command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command_line: &str,
        options: &RunOptions,
    ) -> Result<CommandOutput, ExecutionError> {
        executor::run_shell_command(command_line, options).await
    }
}

#[derive(Debug, Clone)]
enum Variant {
    Passthrough { ruby_executable: String },
    Compose(ComposeSettings),
}

#[derive(Debug, Clone)]
pub struct VersionManager<R = ShellRunner> {
    runner: R,
    workspace_root: PathBuf,
    /// Working directory for every command this instance runs: the directory
    /// of the effective dependency manifest.
    bundle_dir: PathBuf,
    shell: Option<String>,
    variant: Variant,
}

impl VersionManager<ShellRunner> {
    pub fn from_settings(settings: Settings, workspace_root: PathBuf) -> Self {
        Self::with_runner(settings, workspace_root, ShellRunner)
    }
}

impl<R: CommandRunner> VersionManager<R> {
    pub fn with_runner(settings: Settings, workspace_root: PathBuf, runner: R) -> Self {
        let variant = match settings.manager {
            ManagerKind::None => Variant::Passthrough {
                ruby_executable: settings.ruby_executable,
            },
            ManagerKind::Compose => Variant::Compose(ComposeSettings::new(
                settings.compose_service,
                settings.compose_custom_command,
            )),
        };

        Self {
            runner,
            workspace_root,
            bundle_dir: settings.bundle_dir,
            shell: settings.shell,
            variant,
        }
    }

    /// Probes the target environment and returns its normalized description.
    ///
    /// The ambient environment is an explicit input: the passthrough variant
    /// layers the probe's variables over it (probe wins on conflicts), the
    /// compose variant returns a plain copy of it, since variables from
    /// inside the container are meaningless as host process environment.
    /// Failure at any step aborts the whole call; partial results are never
    /// returned.
    pub async fn activate(
        &self,
        ambient_env: &BTreeMap<String, String>,
    ) -> Result<ActivationResult, ManagerError> {
        match &self.variant {
            Variant::Passthrough { ruby_executable } => {
                let parsed = self
                    .run_env_activation_script(ruby_executable, ambient_env)
                    .await?;

                let mut env = ambient_env.clone();
                env.extend(parsed.env);

                Ok(ActivationResult {
                    env,
                    yjit: parsed.yjit,
                    version: parsed.version,
                    gem_path: parsed.gem_path,
                })
            }
            Variant::Compose(compose) => {
                let activated_ruby = format!("{} ruby", compose.run_invocation()?);
                let parsed = self
                    .run_env_activation_script(&activated_ruby, ambient_env)
                    .await?;

                Ok(ActivationResult {
                    env: ambient_env.clone(),
                    yjit: parsed.yjit,
                    version: parsed.version,
                    gem_path: parsed.gem_path,
                })
            }
        }
    }

    /// Runs an arbitrary command in the target environment: unmodified for
    /// passthrough, wrapped in the compose `run` invocation otherwise.
    pub async fn run_activated_script(
        &self,
        command: &str,
        ambient_env: &BTreeMap<String, String>,
    ) -> Result<CommandOutput, ManagerError> {
        let command_line = match &self.variant {
            Variant::Passthrough { .. } => command.to_string(),
            Variant::Compose(compose) => compose.wrap_command(command)?,
        };

        Ok(self
            .runner
            .run(&command_line, &self.run_options(ambient_env))
            .await?)
    }

    /// Builds the invocation a host process would spawn to run `command` in
    /// the target environment. For passthrough the first token becomes the
    /// executable and the rest its arguments; compose prefixes its `run`
    /// invocation and passes the command as one escaped argument.
    pub fn build_executable(&self, command: &[String]) -> Result<ShellCommand, ManagerError> {
        let (program, args) = command.split_first().ok_or(ManagerError::EmptyCommand)?;

        match &self.variant {
            Variant::Passthrough { .. } => Ok(ShellCommand {
                command: program.clone(),
                args: args.to_vec(),
            }),
            Variant::Compose(compose) => Ok(compose.build_executable(command)?),
        }
    }

    /// Builds the host↔container path converter from the orchestration
    /// tool's resolved configuration. The passthrough variant shares the
    /// host filesystem, so its converter is the identity.
    ///
    /// Declared mounts whose local side does not exist or is not a directory
    /// are dropped with a debug log entry; the mapping is best-effort, never
    /// an error.
    pub async fn build_path_converter(
        &self,
        ambient_env: &BTreeMap<String, String>,
    ) -> Result<PathConverter, ManagerError> {
        let Variant::Compose(compose) = &self.variant else {
            return Ok(PathConverter::empty());
        };

        let output = self
            .runner
            .run(
                &compose.config_export_command(),
                &self.run_options(ambient_env),
            )
            .await?;
        let raw_mounts = compose.bind_mounts(&output.stdout)?;

        Ok(self.filter_existing_directories(raw_mounts).await)
    }

    /// Stats every candidate mapping concurrently (all futures fired, then
    /// awaited in input order) and keeps the entries that resolved to an
    /// existing directory.
    async fn filter_existing_directories(&self, raw: Vec<(String, String)>) -> PathConverter {
        let handles: Vec<_> = raw
            .into_iter()
            .map(|(source, target)| {
                let local = resolve_local(&self.workspace_root, &source);
                tokio::spawn(async move {
                    let metadata = tokio::fs::metadata(&local).await;
                    (local, target, metadata)
                })
            })
            .collect();

        let mut mappings = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((local, remote, Ok(metadata))) if metadata.is_dir() => {
                    mappings.push(PathMapping { local, remote });
                }
                Ok((local, _, _)) => {
                    log::debug!(
                        "Dropping path mapping for '{}': not an existing directory.",
                        local.display()
                    );
                }
                Err(e) => {
                    log::warn!("Path mapping stat task failed: {e}");
                }
            }
        }

        PathConverter::new(mappings)
    }

    async fn run_env_activation_script(
        &self,
        activated_ruby: &str,
        ambient_env: &BTreeMap<String, String>,
    ) -> Result<ActivationResult, ManagerError> {
        let command = activation::probe_command(activated_ruby);
        let result = self
            .runner
            .run(&command, &self.run_options(ambient_env))
            .await?;

        Ok(activation::parse_activation_output(&result.stderr)?)
    }

    fn run_options(&self, ambient_env: &BTreeMap<String, String>) -> RunOptions {
        RunOptions {
            cwd: self.bundle_dir.clone(),
            shell: self.shell.clone(),
            env: ambient_env.clone(),
        }
    }
}

fn resolve_local(workspace_root: &Path, source: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(source).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        workspace_root.join(expanded)
    }
}
