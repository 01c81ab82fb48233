// src/constants.rs

/// Marker printed to stderr on both sides of the activation payload, so the
/// payload can be recovered from streams polluted by shell startup noise.
pub const ACTIVATION_SEPARATOR: &str = "RBACTIVATE_ACTIVATION_SEPARATOR";

/// The name of the per-workspace configuration file (at the workspace root).
pub const WORKSPACE_CONFIG_FILENAME: &str = "rbactivate.toml";

/// The name of the global configuration file (inside ~/.config/rbactivate/).
pub const GLOBAL_CONFIG_FILENAME: &str = "config.toml";

/// Interpreter executable probed when none is configured.
pub const DEFAULT_RUBY_EXECUTABLE: &str = "ruby";

/// Compose invocation prefix used when `compose_custom_command` is not set.
/// `--progress quiet` keeps compose's own status output away from the streams
/// the activation payload travels on.
pub const DEFAULT_COMPOSE_COMMAND: &str = "docker compose --progress quiet";

/// Where users are pointed when required compose configuration is missing.
pub const COMPOSE_DOCS_URL: &str = "https://github.com/retypeos/rbactivate#compose";
