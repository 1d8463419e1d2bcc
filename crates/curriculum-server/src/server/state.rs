//! Application state for the web server.

use std::sync::Arc;

use curriculum::interaction::{InteractionLogger, InteractionRecord, LoggedInteraction};
use curriculum::{ContentStore, QueryService};
use tracing::warn;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Read API over the content snapshot.
    pub service: QueryService,
    /// Sink for request/response records.
    pub logger: Arc<InteractionLogger>,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: ContentStore, logger: InteractionLogger) -> Self {
        Self {
            service: QueryService::new(Arc::new(store)),
            logger: Arc::new(logger),
        }
    }

    /// Write an interaction record off the async workers.
    ///
    /// Failures are logged and swallowed; a broken log must not fail the
    /// request it describes.
    pub async fn record(&self, record: InteractionRecord) -> Option<LoggedInteraction> {
        let logger = Arc::clone(&self.logger);
        match tokio::task::spawn_blocking(move || logger.record(&record)).await {
            Ok(Ok(ack)) => Some(ack),
            Ok(Err(e)) => {
                warn!(error = %e, "failed to record interaction");
                None
            }
            Err(e) => {
                warn!(error = %e, "interaction logging task failed");
                None
            }
        }
    }
}
