//! Queue maintenance.

use gateway_core::keys::{INBOUND_QUEUE, OUTBOUND_QUEUE, RESPONSE_PREFIX};
use gateway_core::Result;
use serde::Serialize;
use tracing::info;

use crate::store::KeyedStore;

/// What [`clear_queues`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    /// Queues that existed and were deleted
    pub queues_cleared: Vec<String>,
    /// Direct reply keys deleted
    pub responses_cleared: usize,
}

/// Drops both queues and every pending direct reply.
///
/// Request records and sessions are left alone. Meant for development
/// resets and startup after a worker redeploy; replies in flight are lost.
pub async fn clear_queues(store: &dyn KeyedStore) -> Result<ClearReport> {
    let mut report = ClearReport::default();

    for queue in [INBOUND_QUEUE, OUTBOUND_QUEUE] {
        let existed = store.delete(queue).await?;
        info!(queue, existed, "Cleared queue");
        if existed {
            report.queues_cleared.push(queue.to_string());
        }
    }

    for key in store.scan_prefix(RESPONSE_PREFIX).await? {
        if store.delete(&key).await? {
            report.responses_cleared += 1;
        }
    }

    info!(
        queues = report.queues_cleared.len(),
        responses = report.responses_cleared,
        "Queues and pending replies cleared"
    );
    Ok(report)
}
