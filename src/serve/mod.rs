//! Dev server - Static file server with a build-watch subprocess.
//!
//! Enabled by the `serve` feature. The `workframe` binary wraps [`run`].

mod config;
mod server;
mod watch;

pub use config::{ServeConfig, DEFAULT_DIR, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WATCH};
pub use server::{router, run};
pub use watch::{formatted_timestamp, prefix_line, spawn_watch, WatchStream};
