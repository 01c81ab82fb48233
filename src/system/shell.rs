// src/system/shell.rs

/// Selects the shell that will interpret a command line.
///
/// If the user has configured a preferred shell, we use it, since their
/// version manager hooks are probably sourced in that shell's configuration
/// files. On Windows the preference is never honored: activation commands
/// must run on `cmd.exe` rather than PowerShell, which would reinterpret
/// POSIX quoting and corrupt argument parsing.
pub fn select_shell(preferred: Option<&str>) -> String {
    if cfg!(target_os = "windows") {
        return default_shell().to_string();
    }

    match preferred {
        Some(shell) if !shell.is_empty() => shell.to_string(),
        _ => default_shell().to_string(),
    }
}

/// The platform's fallback shell.
pub fn default_shell() -> &'static str {
    if cfg!(target_os = "windows") {
        "cmd"
    } else {
        "/bin/sh"
    }
}

/// The flag that makes the given shell execute its next argument as a
/// command line: `/C` for the Windows command processor, `-c` elsewhere.
pub fn command_flag(shell: &str) -> &'static str {
    // Split on both separators: a Windows path may be inspected from any host.
    let name = shell.rsplit(['/', '\\']).next().unwrap_or(shell);
    let is_cmd = name.eq_ignore_ascii_case("cmd") || name.eq_ignore_ascii_case("cmd.exe");

    if is_cmd { "/C" } else { "-c" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_os = "windows"))]
    fn preferred_shell_is_honored_on_posix() {
        assert_eq!(select_shell(Some("/bin/zsh")), "/bin/zsh");
    }

    #[test]
    #[cfg(target_os = "windows")]
    fn preferred_shell_is_ignored_on_windows() {
        assert_eq!(select_shell(Some("/bin/zsh")), "cmd");
    }

    #[test]
    fn empty_preference_falls_back_to_default() {
        assert_eq!(select_shell(Some("")), default_shell());
        assert_eq!(select_shell(None), default_shell());
    }

    #[test]
    fn command_flag_matches_shell_family() {
        assert_eq!(command_flag("/bin/sh"), "-c");
        assert_eq!(command_flag("/usr/bin/zsh"), "-c");
        assert_eq!(command_flag("cmd"), "/C");
        assert_eq!(command_flag("C:\\Windows\\System32\\cmd.exe"), "/C");
    }
}
