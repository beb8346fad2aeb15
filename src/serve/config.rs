//! Serve configuration.

use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DIR: &str = "public";
pub const DEFAULT_WATCH: &str = "npm run watch";

/// Dev server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Directory served over HTTP.
    pub dir: PathBuf,
    /// Shell command run alongside the server. `None` disables watching.
    pub watch: Option<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            dir: PathBuf::from(DEFAULT_DIR),
            watch: Some(DEFAULT_WATCH.to_string()),
        }
    }
}

impl ServeConfig {
    /// `host:port` to bind. The host may be a name.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Program and arguments of the watch command, split on whitespace.
    ///
    /// Returns `None` when watching is disabled or the command is blank.
    pub fn watch_command(&self) -> Option<(String, Vec<String>)> {
        let mut parts = self.watch.as_deref()?.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some((program, parts.collect()))
    }
}
