// Concurrent fan-out of the six node-graph queries.
// One task per query, each reporting through its own oneshot channel; the caller folds results in
// completion order. Any failure aborts the call and cancels the queries still in flight.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::accumulate::{Accumulator, TrafficStats};
use super::client::MetricsBackend;
use super::query::{QueryKind, Selector};
use crate::error::{BackendError, GraphError};
use crate::models::Sample;

/// Runs all six queries at evaluation time `at` and folds them into node and edge stats.
///
/// Cancelling `cancel` (or dropping the returned future) aborts the in-flight queries. There is no
/// internal timeout; the caller's deadline governs.
#[instrument(
    skip(backend, selector, window, cancel),
    fields(selector = %selector, window_ms = window.as_millis() as u64)
)]
pub async fn query_node_graph(
    backend: Arc<dyn MetricsBackend>,
    selector: &Selector,
    window: Duration,
    at: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<TrafficStats, GraphError> {
    let token = cancel.child_token();
    let _abort_on_exit = token.clone().drop_guard();

    let mut pending: FuturesUnordered<_> = QueryKind::ALL
        .iter()
        .map(|&kind| {
            let query = kind.promql(selector, window);
            let rx = spawn_query(backend.clone(), kind, query, at, token.clone());
            async move { (kind, rx.await) }
        })
        .collect();

    let mut acc = Accumulator::new();
    while let Some((kind, received)) = pending.next().await {
        let samples = match received {
            Ok(Ok(samples)) => samples,
            Ok(Err(e)) => {
                warn!(query = %kind, error = %e, "node graph query failed");
                return Err(GraphError::backend(kind, e));
            }
            // Worker dropped its sender without reporting (panicked or runtime shutting down).
            Err(_) => return Err(GraphError::backend(kind, BackendError::Cancelled)),
        };
        debug!(query = %kind, samples = samples.len(), "node graph query complete");
        acc.accumulate(&samples, kind.assign());
    }

    let stats = acc.finish();
    debug!(
        nodes = stats.nodes.len(),
        edges = stats.edges.len(),
        "node graph accumulated"
    );
    Ok(stats)
}

/// Spawns one query worker. The worker stops early when `token` is cancelled.
fn spawn_query(
    backend: Arc<dyn MetricsBackend>,
    kind: QueryKind,
    query: String,
    at: DateTime<Utc>,
    token: CancellationToken,
) -> oneshot::Receiver<Result<Vec<Sample>, BackendError>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(BackendError::Cancelled),
            result = backend.instant_query(&query, at) => result,
        };
        if tx.send(outcome).is_err() {
            debug!(query = %kind, "node graph query result dropped");
        }
    });
    rx
}
