//! HTTP server - Serves the app directory.

use std::path::Path;

use axum::Router;
use crossterm::style::Stylize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::config::ServeConfig;
use super::watch::spawn_watch;

/// Router serving every file under `dir`.
pub fn router(dir: impl AsRef<Path>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir.as_ref()))
        .layer(TraceLayer::new_for_http())
}

fn banner(config: &ServeConfig) {
    println!();
    println!("  {}", "Running dev server".green().underlined());
    println!("  → serving {}", config.dir.display());
    println!("  → listening on {}", config.url().cyan());
    if let Some(watch) = &config.watch {
        println!("  → watching with {}", watch.as_str().dim());
    }
    println!();
}

/// Serve until the process is stopped.
pub async fn run(config: ServeConfig) -> anyhow::Result<()> {
    if !config.dir.is_dir() {
        log::warn!("{} is not a directory; every request will 404", config.dir.display());
    }

    let listener = tokio::net::TcpListener::bind(config.address())
        .await
        .map_err(|err| anyhow::anyhow!("failed to bind {}: {err}", config.address()))?;

    banner(&config);
    // Held so the child is killed when the server stops.
    let _watch = spawn_watch(&config);

    axum::serve(listener, router(&config.dir)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn public_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("workframe-serve-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<div id=\"app\"></div>").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let dir = public_dir("hit");
        let response = router(&dir)
            .oneshot(Request::get("/index.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = public_dir("miss");
        let response = router(&dir)
            .oneshot(Request::get("/nope.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
