use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use sqlx::PgPool;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::discovery::source::JobSource;
use crate::llm_client::LlmClient;

/// Shared application state. Constructed once in `main` and passed explicitly
/// to the dispatcher, the scheduler and the route handlers — no module-level
/// singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Connection used for publishing events. Safe for concurrent use;
    /// cloned per pipeline run.
    pub publisher: MultiplexedConnection,
    pub llm: LlmClient,
    pub config: Config,
    /// Bounds the number of concurrently in-flight pipeline runs.
    pub limiter: Arc<Semaphore>,
    /// Pluggable listings backend. Default: Adzuna.
    pub source: Arc<dyn JobSource>,
}
