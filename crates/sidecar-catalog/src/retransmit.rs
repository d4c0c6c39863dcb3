use std::time::Duration;

use tokio::sync::mpsc;

use crate::service::Service;

/// Send `batch` on `tx` `times` times, spaced by `spacing`, nudging each
/// repeat's `Updated` by the per-retransmission delta so peers treat it as
/// newer and re-propagate it without altering its substance (spec §4.2,
/// §4.3, §4.4). A no-op for an empty batch or zero repeats.
///
/// Shared by `sidecar-loopers` (broadcast/tombstone loop retransmits) and
/// `sidecar-membership` (`ExpireServer`'s departure tombstones), so it lives
/// alongside `Service` rather than in either downstream crate.
pub async fn retransmit_batch(tx: &mpsc::Sender<Option<Vec<Service>>>, mut batch: Vec<Service>, times: usize, spacing: Duration) {
    if batch.is_empty() || times == 0 {
        return;
    }
    let _ = tx.send(Some(batch.clone())).await;
    for _ in 1..times {
        tokio::time::sleep(spacing).await;
        for svc in batch.iter_mut() {
            svc.nudge_for_retransmit();
        }
        let _ = tx.send(Some(batch.clone())).await;
    }
}
