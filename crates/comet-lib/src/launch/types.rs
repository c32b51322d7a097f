/// Core types for the launch pipeline.
use std::path::PathBuf;

/// Remote bundle names on the content server. The per-asset cache directory
/// for each is the bundle name without its extension.
pub const RUNTIME_BUNDLE: &str = "jre-21.0.2.zip";
pub const LIBRARIES_BUNDLE: &str = "libraries.zip";
pub const NATIVES_BUNDLE: &str = "natives.zip";
pub const LIBRARIES_LEGACY_BUNDLE: &str = "libraries-1.12.zip";
pub const NATIVES_LEGACY_BUNDLE: &str = "natives-1.12.zip";
pub const LIBRARIES_FABRIC_BUNDLE: &str = "libraries-1.21.zip";
pub const ASSETS_BUNDLE: &str = "assets.zip";

/// Asset index pinned for Fabric-kind targets.
pub const FABRIC_ASSET_INDEX: &str = "1.16";

/// Fixed offline session identity.
pub const OFFLINE_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Host platform, as far as invocation building cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Windows,
    Linux,
    MacOS,
}

impl OsType {
    /// Detect the current OS.
    pub fn current() -> Self {
        #[cfg(target_os = "windows")]
        return OsType::Windows;

        #[cfg(target_os = "macos")]
        return OsType::MacOS;

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        return OsType::Linux;
    }

    /// Get the classpath separator for this OS.
    pub fn classpath_separator(&self) -> &'static str {
        match self {
            OsType::Windows => ";",
            _ => ":",
        }
    }

    /// Name of the runtime executable inside the bundled runtime's bin dir.
    pub fn runtime_executable(&self) -> &'static str {
        match self {
            OsType::Windows => "java.exe",
            _ => "java",
        }
    }
}

/// Launch pipeline state, logged as the run advances. Fetch failures
/// short-circuit straight to `Done`; there is no separate error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    DownloadingSelf,
    DownloadingRequirements,
    Launching,
    Running,
    LogAnalysis,
    Done,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::DownloadingSelf => "downloading-self",
            RunPhase::DownloadingRequirements => "downloading-requirements",
            RunPhase::Launching => "launching",
            RunPhase::Running => "running",
            RunPhase::LogAnalysis => "log-analysis",
            RunPhase::Done => "done",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully constructed child-process invocation. Built fresh for every run,
/// never persisted. All paths are relative to `current_dir`.
#[derive(Debug, Clone)]
pub struct LaunchInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
}

impl LaunchInvocation {
    /// Human-readable command line for logs, with shell-style quoting.
    pub fn command_line(&self) -> String {
        let mut parts = vec![quote_arg(&self.program.to_string_lossy())];
        parts.extend(self.args.iter().map(|a| quote_arg(a)));
        parts.join(" ")
    }
}

pub(crate) fn quote_arg(s: &str) -> String {
    if s.is_empty() {
        return "\"\"".to_string();
    }
    if s.chars().any(|c| c.is_whitespace() || c == '"') {
        let esc = s.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{}\"", esc);
    }
    s.to_string()
}

/// What a finished (or aborted) run looked like.
#[derive(Debug)]
pub struct LaunchOutcome {
    /// False when a fetch failure short-circuited the run before spawn.
    pub launched: bool,

    /// Present when the captured output contained the crash marker.
    pub verdict: Option<crate::crash::CrashVerdict>,
}

impl LaunchOutcome {
    pub fn crashed(&self) -> bool {
        self.verdict.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_arg_quotes_paths_with_spaces() {
        let out = quote_arg("C:\\Program Files\\Runtime");
        assert!(out.starts_with('"') && out.ends_with('"'));
        assert!(out.contains("Program Files"));

        assert_eq!(quote_arg("no_spaces"), "no_spaces");
        assert_eq!(quote_arg(""), "\"\"");
    }

    #[test]
    fn classpath_separator_per_os() {
        assert_eq!(OsType::Windows.classpath_separator(), ";");
        assert_eq!(OsType::Linux.classpath_separator(), ":");
        assert_eq!(OsType::MacOS.classpath_separator(), ":");
    }
}
