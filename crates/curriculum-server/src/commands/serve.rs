//! Serve command - run the HTTP gateway.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use curriculum::interaction::{InteractionLogConfig, InteractionLogger};
use curriculum::{CachePolicy, ContentStore};
use tracing::{error, info, warn};

use crate::cli::ContentArgs;
use crate::server::{app, state::AppState};

pub fn run(
    content: ContentArgs,
    host: String,
    port: u16,
    cache_policy: CachePolicy,
    cors_origins: Vec<String>,
    log_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let ip: IpAddr = host
        .parse()
        .map_err(|e| format!("Invalid host '{}': {}", host, e))?;
    let addr = SocketAddr::new(ip, port);

    let config = content.to_config(cache_policy);
    let store = ContentStore::new(&config)?;

    if !config.content_dir.is_dir() {
        warn!(
            dir = %config.content_dir.display(),
            "content directory does not exist, serving empty content"
        );
    }

    // Load once up front so problems show in the startup log
    let graph = store.graph();
    let summary = graph.summary();
    info!("======================================");
    info!("  Curriculum content server");
    info!("======================================");
    info!("Content: {}", config.content_dir.display());
    info!("Cache policy: {}", cache_policy);
    info!(
        "Loaded {} domains, {} clusters, {} concepts, {} exercises from {} documents",
        summary.domains, summary.clusters, summary.concepts, summary.exercises, summary.documents
    );
    if !graph.is_consistent() {
        warn!(
            dangling = summary.dangling_references,
            duplicates = summary.duplicate_ids,
            rejected = summary.rejected_records,
            "content has consistency problems; run 'curriculum check' for details"
        );
    }
    info!("Interaction log: {}", log_dir.join("app.log").display());
    info!("======================================");
    drop(graph);

    let logger = InteractionLogger::new(InteractionLogConfig::new(log_dir));
    let state = AppState::new(store, logger);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        tokio::spawn(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
            std::process::exit(0);
        });

        app::run_server(state, addr, &cors_origins)
            .await
            .inspect_err(|e| error!("Server error: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;

    use tempfile::TempDir;

    #[test]
    fn test_bind_failure_is_an_error() {
        let content = TempDir::new().unwrap();
        let logs = TempDir::new().unwrap();
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let args = ContentArgs {
            content_dir: content.path().to_path_buf(),
            curriculum: "CURRICULUM.yaml".to_string(),
            lesson_pattern: "*.yaml".to_string(),
        };
        let result = run(
            args,
            "127.0.0.1".to_string(),
            port,
            CachePolicy::Rebuild,
            Vec::new(),
            logs.path().to_path_buf(),
        );

        assert!(result.is_err());
    }
}
