// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// --- ACTIVATION MODELS ---

/// The normalized description of an activated Ruby environment.
///
/// This is the output contract consumed by whatever boots the dependent tool.
/// All four fields are present after a successful activation; partial results
/// are never produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ActivationResult {
    /// The full process environment to use for the dependent tool.
    /// Ordered so that serialized output is deterministic.
    pub env: BTreeMap<String, String>,
    /// Whether the interpreter was built with YJIT available.
    pub yjit: bool,
    /// The interpreter's semantic version string (e.g. "3.3.0").
    pub version: String,
    /// Directories the interpreter searches for gems, in priority order.
    #[serde(rename = "gemPath")]
    pub gem_path: Vec<String>,
}

/// A concrete program invocation: executable plus argument vector.
///
/// Produced by `build_executable` and consumed immediately by whatever spawns
/// the dependent tool; never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub command: String,
    pub args: Vec<String>,
}

// --- CONFIGURATION FILE MODELS (rbactivate.toml / config.toml) ---

/// Which version manager variant drives activation for a workspace.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ManagerKind {
    /// The interpreter is already reachable on the ambient PATH.
    #[default]
    None,
    /// The interpreter runs inside a compose-managed service.
    Compose,
}

/// One configuration layer, as deserialized from a TOML file.
///
/// Every field is optional so that layers can be merged field-by-field; the
/// workspace layer wins over the global layer wherever both are set.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ConfigFile {
    /// Version manager selection. Defaults to `none`.
    pub manager: Option<ManagerKind>,
    /// Interpreter executable probed by the `none` variant. Defaults to `ruby`.
    pub ruby_executable: Option<String>,
    /// Preferred shell for running activation commands. Ignored on Windows.
    pub shell: Option<String>,
    /// Path to the dependency manifest (Gemfile). Relative paths are resolved
    /// against the workspace root; its directory becomes the working
    /// directory for all activation commands.
    pub bundle_gemfile: Option<String>,
    #[serde(default)]
    pub version_manager: VersionManagerConfig,
}

/// The `[version_manager]` table of a configuration file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct VersionManagerConfig {
    /// Compose service to activate inside. Required for the compose variant.
    pub compose_service: Option<String>,
    /// Overrides the default `docker compose --progress quiet` prefix.
    pub compose_custom_command: Option<String>,
}

/// The fully merged, resolved configuration for one workspace session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub manager: ManagerKind,
    pub ruby_executable: String,
    pub shell: Option<String>,
    /// Working directory for activation commands: the directory of the
    /// resolved bundle gemfile, or the workspace root.
    pub bundle_dir: PathBuf,
    pub compose_service: Option<String>,
    pub compose_custom_command: Option<String>,
}

// --- COMPOSE `config --format=json` MODELS ---

/// The slice of `docker compose config --format=json` output we consume.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ComposeProjectConfig {
    #[serde(default)]
    pub services: BTreeMap<String, ComposeService>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ComposeService {
    #[serde(default)]
    pub volumes: Vec<ComposeVolume>,
}

/// A volume declaration. `config` normalizes to the long form, but the short
/// `source:target[:mode]` string form is accepted as well.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ComposeVolume {
    Long {
        #[serde(rename = "type")]
        kind: Option<String>,
        source: Option<String>,
        target: Option<String>,
    },
    Short(String),
}

impl ComposeVolume {
    /// Extracts the `local -> container` pair for bind mounts.
    /// Named volumes and incomplete declarations yield `None`.
    pub fn bind_mapping(&self) -> Option<(String, String)> {
        match self {
            Self::Long { kind, source, target } => {
                if kind.as_deref().is_some_and(|kind| kind != "bind") {
                    return None;
                }
                Some((source.clone()?, target.clone()?))
            }
            Self::Short(spec) => {
                let (source, rest) = spec.split_once(':')?;
                let target = rest.split(':').next().unwrap_or(rest);
                if source.is_empty() || target.is_empty() {
                    return None;
                }
                Some((source.to_string(), target.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_volume_bind_mapping() {
        let volume = ComposeVolume::Long {
            kind: Some("bind".to_string()),
            source: Some("/host/app".to_string()),
            target: Some("/app".to_string()),
        };
        assert_eq!(
            volume.bind_mapping(),
            Some(("/host/app".to_string(), "/app".to_string()))
        );
    }

    #[test]
    fn named_volume_is_skipped() {
        let volume = ComposeVolume::Long {
            kind: Some("volume".to_string()),
            source: Some("gem_cache".to_string()),
            target: Some("/usr/local/bundle".to_string()),
        };
        assert_eq!(volume.bind_mapping(), None);
    }

    #[test]
    fn short_volume_with_mode() {
        let volume = ComposeVolume::Short("./src:/app/src:ro".to_string());
        assert_eq!(
            volume.bind_mapping(),
            Some(("./src".to_string(), "/app/src".to_string()))
        );
    }

    #[test]
    fn compose_config_json_deserializes() {
        let raw = r#"{
            "services": {
                "develop": {
                    "volumes": [
                        {"type": "bind", "source": "/home/user/app", "target": "/app"},
                        {"type": "volume", "source": "bundle", "target": "/usr/local/bundle"}
                    ]
                }
            }
        }"#;
        let config: ComposeProjectConfig = serde_json::from_str(raw).expect("valid config JSON");
        let develop = config.services.get("develop").expect("service present");
        assert_eq!(develop.volumes.len(), 2);
        assert_eq!(
            develop.volumes.iter().filter_map(ComposeVolume::bind_mapping).count(),
            1
        );
    }

    #[test]
    fn activation_result_uses_wire_key_for_gem_path() {
        let result = ActivationResult {
            env: BTreeMap::new(),
            yjit: false,
            version: "3.3.0".to_string(),
            gem_path: vec!["/gems".to_string()],
        };
        let json = serde_json::to_string(&result).expect("serializable");
        assert!(json.contains("\"gemPath\""));
    }
}
