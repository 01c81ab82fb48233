// src/system/executor.rs

use crate::system::shell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] std::io::Error),
    #[error(
        "Command '{command}' exited with status {code:?}.\nstdout: {stdout}\nstderr: {stderr}"
    )]
    NonZeroExitStatus {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Where and how a command line is executed.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Working directory; always the directory of the effective dependency
    /// manifest, not the repository root in general.
    pub cwd: PathBuf,
    /// The user's preferred shell, if any. Subject to the platform policy in
    /// [`shell::select_shell`].
    pub shell: Option<String>,
    /// The full environment for the child process.
    pub env: BTreeMap<String, String>,
}

/// Runs a command line through the selected shell, capturing its output.
///
/// The command is interpreted by one shell invocation (`<shell> -c <line>`,
/// `cmd /C <line>` on Windows), so version-manager hooks sourced by the
/// user's shell participate in resolution. A nonzero exit status is an
/// error carrying both captured streams for diagnosis; it is never swallowed.
pub async fn run_shell_command(
    command_line: &str,
    options: &RunOptions,
) -> Result<CommandOutput, ExecutionError> {
    let resolved_shell = shell::select_shell(options.shell.as_deref());
    let clean_cwd = dunce::simplified(&options.cwd).to_path_buf();

    log::info!(
        "Running command: `{}` in {} using shell: {}",
        command_line,
        clean_cwd.display(),
        resolved_shell
    );
    log::debug!("Environment used for command: {:?}", options.env);

    let output = Command::new(&resolved_shell)
        .arg(shell::command_flag(&resolved_shell))
        .arg(command_line)
        .current_dir(&clean_cwd)
        .env_clear()
        .envs(&options.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| ExecutionError::CommandFailed(command_line.to_string(), e))?;

    let stdout =
        String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
            command: command_line.to_string(),
            source: e,
        })?;
    let stderr =
        String::from_utf8(output.stderr).map_err(|e| ExecutionError::InvalidUtf8Output {
            command: command_line.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: command_line.to_string(),
            code: output.status.code(),
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn options() -> RunOptions {
        RunOptions {
            cwd: env::temp_dir(),
            shell: None,
            env: env::vars().collect(),
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn captures_both_streams() {
        let output = run_shell_command("echo out && echo err >&2", &options())
            .await
            .expect("command succeeds");
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn nonzero_exit_carries_captured_output() {
        let error = run_shell_command("echo oops >&2; exit 3", &options())
            .await
            .expect_err("command fails");
        match error {
            ExecutionError::NonZeroExitStatus { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn child_sees_exactly_the_provided_environment() {
        let mut opts = options();
        opts.env.insert("RBACTIVATE_PROBE".to_string(), "1".to_string());
        let output = run_shell_command("printf '%s' \"$RBACTIVATE_PROBE\"", &opts)
            .await
            .expect("command succeeds");
        assert_eq!(output.stdout, "1");
    }
}
