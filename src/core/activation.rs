//! # Activation Script Protocol
//!
//! A small probe script, evaluated by the target Ruby interpreter, serializes
//! the interpreter's environment, version, YJIT availability, and gem search
//! paths as JSON, wrapped between two copies of a sentinel string on stderr.
//!
//! The payload travels on stderr rather than stdout because stdout is the
//! stream most likely to be polluted by shell initialization output (profile
//! banners, version manager hooks). The sentinel makes extraction robust to
//! noise on either side of the payload.

use crate::constants::ACTIVATION_SEPARATOR;
use crate::models::ActivationResult;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Captures the text between two sentinel occurrences. Compiled once.
    static ref PAYLOAD_REGEX: Regex = Regex::new(&format!(
        "{ACTIVATION_SEPARATOR}(.*){ACTIVATION_SEPARATOR}"
    ))
    .expect("sentinel regex is valid");

    /// The Ruby expression evaluated by the interpreter under probe.
    static ref ACTIVATION_SCRIPT: String = format!(
        "STDERR.print(\"{ACTIVATION_SEPARATOR}\" + \
         {{ env: ENV.to_h, yjit: !!defined?(RubyVM::YJIT), version: RUBY_VERSION, gemPath: Gem.path }}.to_json + \
         \"{ACTIVATION_SEPARATOR}\")"
    );
}

#[derive(Error, Debug)]
pub enum ActivationError {
    /// The interpreter ran but no sentinel-delimited payload appeared on
    /// stderr: wrong invocation, a crashed interpreter, or permissions.
    /// Fatal for the whole activation call; nothing is recovered partially.
    #[error("Activation script did not produce the expected output.")]
    MissingPayload,
    /// A payload was found between the sentinels but is not valid JSON.
    #[error("Invalid JSON in activation payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// The full probe invocation for an already-reachable interpreter command.
///
/// `-W0` silences interpreter warnings that would otherwise land on stderr
/// next to the payload; `-rjson` makes `to_json` available. The script
/// contains no single quotes, so wrapping it in single quotes is safe under
/// any POSIX shell.
pub fn probe_command(activated_ruby: &str) -> String {
    format!("{activated_ruby} -W0 -rjson -e '{}'", *ACTIVATION_SCRIPT)
}

/// Extracts and parses the sentinel-delimited payload from captured stderr.
///
/// No sentinel match is a protocol error. A matched but unparsable payload is
/// logged verbatim at error severity for diagnosis and then propagated; a
/// default environment is never substituted.
pub fn parse_activation_output(stderr: &str) -> Result<ActivationResult, ActivationError> {
    let payload = PAYLOAD_REGEX
        .captures(stderr)
        .and_then(|captures| captures.get(1))
        .ok_or(ActivationError::MissingPayload)?
        .as_str();

    serde_json::from_str(payload).map_err(|e| {
        log::error!("Tried parsing invalid JSON environment: {payload}");
        ActivationError::InvalidPayload(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn wrap(payload: &str) -> String {
        format!("{ACTIVATION_SEPARATOR}{payload}{ACTIVATION_SEPARATOR}")
    }

    #[test]
    fn recovers_payload_between_sentinels() {
        let raw = r#"{"env":{"ANY":"true"},"yjit":true,"version":"3.0.0","gemPath":[]}"#;
        let result = parse_activation_output(&wrap(raw)).expect("payload parses");

        assert_eq!(result.version, "3.0.0");
        assert!(result.yjit);
        assert_eq!(result.env.get("ANY").map(String::as_str), Some("true"));
        assert!(result.gem_path.is_empty());
    }

    #[test]
    fn tolerates_noise_around_the_payload() {
        let raw = r#"{"env":{},"yjit":false,"version":"3.3.5","gemPath":["/gems"]}"#;
        let noisy = format!("Welcome to your shell!\n{}\ntrailing warning", wrap(raw));
        let result = parse_activation_output(&noisy).expect("payload parses");

        assert_eq!(result.version, "3.3.5");
        assert_eq!(result.gem_path, vec!["/gems".to_string()]);
    }

    #[test]
    fn missing_sentinel_is_a_protocol_error() {
        let error = parse_activation_output("ruby: command not found").expect_err("no payload");
        assert!(matches!(error, ActivationError::MissingPayload));
    }

    #[test]
    fn unparsable_payload_propagates_the_json_error() {
        let error = parse_activation_output(&wrap("{not json")).expect_err("bad payload");
        assert!(matches!(error, ActivationError::InvalidPayload(_)));
    }

    #[test]
    fn round_trip_through_the_wire_format() {
        let mut env = BTreeMap::new();
        env.insert("GEM_HOME".to_string(), "/gems".to_string());
        let original = ActivationResult {
            env,
            yjit: true,
            version: "3.4.1".to_string(),
            gem_path: vec!["/gems".to_string(), "/usr/lib/gems".to_string()],
        };

        let encoded = wrap(&serde_json::to_string(&original).expect("serializable"));
        let decoded = parse_activation_output(&encoded).expect("payload parses");
        assert_eq!(decoded, original);
    }

    #[test]
    fn probe_command_carries_interpreter_flags() {
        let command = probe_command("ruby");
        assert!(command.starts_with("ruby -W0 -rjson -e '"));
        assert!(command.contains("RubyVM::YJIT"));
        assert!(command.ends_with('\''));
    }
}
