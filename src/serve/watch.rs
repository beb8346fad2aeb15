//! Watch subprocess - Runs the build-watch command and forwards its output.
//!
//! Each line goes to the stream it came from, prefixed with a local
//! timestamp. A command that fails to start or exits with failure is
//! logged; the server keeps running.

use std::io::Write;
use std::process::Stdio;

use chrono::{DateTime, Local};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::config::ServeConfig;

/// Stream a forwarded line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStream {
    Stdout,
    Stderr,
}

/// `[YYYY-MM-DD HH:MM:SS]`
pub fn formatted_timestamp(at: DateTime<Local>) -> String {
    at.format("[%Y-%m-%d %H:%M:%S]").to_string()
}

pub fn prefix_line(at: DateTime<Local>, line: &str) -> String {
    format!("{} {line}", formatted_timestamp(at))
}

fn emit(stream: WatchStream, line: &str) {
    let line = prefix_line(Local::now(), line);
    // A closed stdio stream drops the line.
    let _ = match stream {
        WatchStream::Stdout => writeln!(std::io::stdout(), "{line}"),
        WatchStream::Stderr => writeln!(std::io::stderr(), "{line}"),
    };
}

async fn forward(reader: impl AsyncRead + Unpin, stream: WatchStream) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => emit(stream, &line),
            Ok(None) => break,
            Err(err) => {
                log::warn!("reading watch {stream:?} failed: {err}");
                break;
            }
        }
    }
}

/// Spawn the configured watch command.
///
/// Returns `None` when watching is disabled or the command cannot start.
pub fn spawn_watch(config: &ServeConfig) -> Option<JoinHandle<()>> {
    let (program, args) = config.watch_command()?;
    let label = config.watch.clone().unwrap_or_default();

    let mut cmd = Command::new(&program);
    cmd.args(&args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            log::error!("failed to start watch command `{label}`: {err}");
            return None;
        }
    };
    log::info!("watching with `{label}`");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    Some(tokio::spawn(async move {
        let out = async {
            if let Some(stdout) = stdout {
                forward(stdout, WatchStream::Stdout).await;
            }
        };
        let err = async {
            if let Some(stderr) = stderr {
                forward(stderr, WatchStream::Stderr).await;
            }
        };
        tokio::join!(out, err);

        match child.wait().await {
            Ok(status) if status.success() => log::info!("watch command `{label}` exited"),
            Ok(status) => log::error!("watch command `{label}` failed with {status}"),
            Err(err) => log::error!("waiting for watch command `{label}` failed: {err}"),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(formatted_timestamp(at), "[2024-03-09 07:05:01]");
        assert_eq!(prefix_line(at, "built"), "[2024-03-09 07:05:01] built");
    }

    #[tokio::test]
    async fn test_missing_program_is_not_fatal() {
        let config = ServeConfig {
            watch: Some("workframe-no-such-program --flag".to_string()),
            ..ServeConfig::default()
        };
        assert!(spawn_watch(&config).is_none());
    }

    #[tokio::test]
    async fn test_disabled_watch_spawns_nothing() {
        let config = ServeConfig {
            watch: None,
            ..ServeConfig::default()
        };
        assert!(spawn_watch(&config).is_none());
    }
}
