//! Batch coordination.

use crate::response::RpcOutcome;

/// Collapse per-item outcomes into the reply sequence.
///
/// Empty slots (notifications) drop out, order survives, and a batch left
/// with nothing yields `None`: callers must emit no frame in that case,
/// never an empty collection.
pub fn collect_batch(outcomes: Vec<Option<RpcOutcome>>) -> Option<Vec<RpcOutcome>> {
    let collected: Vec<RpcOutcome> = outcomes.into_iter().flatten().collect();
    if collected.is_empty() { None } else { Some(collected) }
}
