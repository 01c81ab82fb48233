//! # Container Path Converter
//!
//! Bidirectional translation between host paths and their in-container
//! counterparts, driven by the bind mounts a compose service declares. The
//! mapping is a set of prefix substitution rules with longest-prefix match;
//! an empty mapping yields an identity converter. Construction never fails.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// One substitution rule: a host directory and the container path it is
/// mounted at. The host side is guaranteed to be an existing directory by
/// the filtering done at construction time.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub local: PathBuf,
    pub remote: String,
}

/// Immutable after construction; owned by the compose variant and built at
/// most once per session, never during plain activation.
#[derive(Serialize, Debug, Clone, Default)]
pub struct PathConverter {
    mappings: Vec<PathMapping>,
}

impl PathConverter {
    pub fn new(mappings: Vec<PathMapping>) -> Self {
        Self { mappings }
    }

    /// A converter that translates nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mappings(&self) -> &[PathMapping] {
        &self.mappings
    }

    /// Translates a host path into the container mount namespace. Paths
    /// outside every mapped root pass through unchanged.
    pub fn to_container(&self, host_path: &Path) -> String {
        let best = self
            .mappings
            .iter()
            .filter_map(|mapping| {
                host_path
                    .strip_prefix(&mapping.local)
                    .ok()
                    .map(|rest| (mapping, rest))
            })
            .max_by_key(|(mapping, _)| mapping.local.components().count());

        match best {
            Some((mapping, rest)) => join_remote(&mapping.remote, rest),
            None => host_path.to_string_lossy().into_owned(),
        }
    }

    /// Translates a container path back to the host filesystem. Paths outside
    /// every mapped target pass through unchanged.
    pub fn to_host(&self, container_path: &str) -> PathBuf {
        let best = self
            .mappings
            .iter()
            .filter_map(|mapping| {
                strip_posix_prefix(container_path, &mapping.remote)
                    .map(|rest| (mapping, rest))
            })
            .max_by_key(|(mapping, _)| mapping.remote.len());

        match best {
            Some((mapping, rest)) => {
                if rest.is_empty() {
                    mapping.local.clone()
                } else {
                    mapping.local.join(rest)
                }
            }
            None => PathBuf::from(container_path),
        }
    }
}

/// Joins a container mount target with a host-relative remainder, always
/// producing a POSIX-style path regardless of the host separator.
fn join_remote(remote: &str, rest: &Path) -> String {
    let mut result = remote.trim_end_matches('/').to_string();
    for component in rest.components() {
        result.push('/');
        result.push_str(&component.as_os_str().to_string_lossy());
    }
    if result.is_empty() {
        // The mount target was "/" and the remainder empty.
        result.push('/');
    }
    result
}

/// Strips `prefix` from `path` only at a path-component boundary.
fn strip_posix_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let trimmed_prefix = prefix.trim_end_matches('/');
    let rest = path.strip_prefix(trimmed_prefix)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> PathConverter {
        PathConverter::new(vec![
            PathMapping {
                local: PathBuf::from("/home/user/project"),
                remote: "/app".to_string(),
            },
            PathMapping {
                local: PathBuf::from("/home/user/project/gems"),
                remote: "/usr/local/bundle".to_string(),
            },
        ])
    }

    #[test]
    fn translates_host_to_container() {
        let path = Path::new("/home/user/project/lib/server.rb");
        assert_eq!(converter().to_container(path), "/app/lib/server.rb");
    }

    #[test]
    fn longest_prefix_wins() {
        let path = Path::new("/home/user/project/gems/rails");
        assert_eq!(converter().to_container(path), "/usr/local/bundle/rails");
        assert_eq!(
            converter().to_host("/usr/local/bundle/rails"),
            PathBuf::from("/home/user/project/gems/rails")
        );
    }

    #[test]
    fn translates_container_to_host() {
        assert_eq!(
            converter().to_host("/app/Gemfile"),
            PathBuf::from("/home/user/project/Gemfile")
        );
    }

    #[test]
    fn exact_root_translates_to_mount_target() {
        assert_eq!(
            converter().to_container(Path::new("/home/user/project")),
            "/app"
        );
        assert_eq!(
            converter().to_host("/app"),
            PathBuf::from("/home/user/project")
        );
    }

    #[test]
    fn unmapped_paths_pass_through() {
        assert_eq!(converter().to_container(Path::new("/etc/hosts")), "/etc/hosts");
        assert_eq!(converter().to_host("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn prefix_matches_only_at_component_boundaries() {
        // "/application" must not match the "/app" mount.
        assert_eq!(
            converter().to_host("/application/x"),
            PathBuf::from("/application/x")
        );
    }

    #[test]
    fn empty_converter_is_identity() {
        let identity = PathConverter::empty();
        assert!(identity.is_empty());
        assert_eq!(identity.to_container(Path::new("/anything")), "/anything");
        assert_eq!(identity.to_host("/anything"), PathBuf::from("/anything"));
    }
}
