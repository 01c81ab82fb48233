// src/cli/handlers.rs

use crate::core::{config, version_manager::VersionManager};
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Builds the version manager for a workspace from its merged configuration.
fn build_manager(workspace_root: &Path) -> Result<VersionManager> {
    let settings = config::load(workspace_root)?;
    log::debug!("Resolved settings: {settings:?}");
    Ok(VersionManager::from_settings(
        settings,
        workspace_root.to_path_buf(),
    ))
}

/// The ambient process environment, captured once at the CLI boundary. The
/// core only ever sees this as an explicit argument.
fn ambient_env() -> BTreeMap<String, String> {
    std::env::vars().collect()
}

pub async fn activate(workspace_root: &Path, pretty: bool) -> Result<()> {
    let manager = build_manager(workspace_root)?;
    let result = manager.activate(&ambient_env()).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");

    Ok(())
}

pub async fn run(workspace_root: &Path, command: &[String]) -> Result<()> {
    let manager = build_manager(workspace_root)?;
    let output = manager
        .run_activated_script(&command.join(" "), &ambient_env())
        .await?;

    // Relay the captured streams untouched.
    print!("{}", output.stdout);
    eprint!("{}", output.stderr);
    std::io::stdout().flush()?;
    std::io::stderr().flush()?;

    Ok(())
}

pub async fn wrap(workspace_root: &Path, command: &[String]) -> Result<()> {
    let manager = build_manager(workspace_root)?;
    let executable = manager.build_executable(command)?;
    println!("{}", serde_json::to_string(&executable)?);

    Ok(())
}

pub async fn paths(workspace_root: &Path, to_host: bool, paths: &[String]) -> Result<()> {
    let manager = build_manager(workspace_root)?;
    let converter = manager.build_path_converter(&ambient_env()).await?;

    if paths.is_empty() {
        println!("{}", serde_json::to_string_pretty(converter.mappings())?);
        return Ok(());
    }

    for path in paths {
        if to_host {
            println!("{}", converter.to_host(path).display());
        } else {
            println!("{}", converter.to_container(&PathBuf::from(path)));
        }
    }

    Ok(())
}
