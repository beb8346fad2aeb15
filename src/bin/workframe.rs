//! workframe - Development CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use workframe::serve::{self, ServeConfig, DEFAULT_DIR, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_WATCH};

#[derive(Parser, Debug)]
#[command(name = "workframe", version, about = "Development tools for workframe apps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the app directory and run the build watcher
    Serve {
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Directory to serve
        #[arg(short, long, default_value = DEFAULT_DIR)]
        dir: PathBuf,

        /// Build-watch command run alongside the server
        #[arg(short, long, default_value = DEFAULT_WATCH)]
        watch: String,

        /// Do not run the watch command
        #[arg(long)]
        no_watch: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Serve {
            port,
            host,
            dir,
            watch,
            no_watch,
        } => {
            let config = ServeConfig {
                host,
                port,
                dir,
                watch: (!no_watch).then_some(watch),
            };
            serve::run(config).await
        }
    }
}
