use super::counters::Counters;
use blockswap_api::{scope::CancellationToken, *};
use std::sync::Arc;

/// Send the blocks the engine schedules until `scope` is cancelled.
pub(super) async fn task_worker(
    scope: CancellationToken,
    engine: DynEngine,
    want_manager: DynWantManager,
    counters: Arc<Counters>,
) {
    tracing::debug!("task worker starting");

    loop {
        let outbox = tokio::select! {
            biased;
            _ = scope.cancelled() => break,
            outbox = engine.next_outbox() => outbox,
        };

        let Some(outbox) = outbox else {
            // No more delivery channels will be published. Don't spin on
            // the closed outbox, just wait to be shut down.
            tracing::debug!("engine outbox closed, task worker idle");
            scope.cancelled().await;
            break;
        };

        let unit = tokio::select! {
            biased;
            _ = scope.cancelled() => break,
            unit = outbox => unit,
        };

        // The channel closed without anything to send.
        let Ok(unit) = unit else {
            continue;
        };

        send_unit(&scope, &engine, &want_manager, &counters, unit).await;
    }

    tracing::debug!("task worker shutting down");
}

async fn send_unit(
    scope: &CancellationToken,
    engine: &DynEngine,
    want_manager: &DynWantManager,
    counters: &Counters,
    unit: DeliveryUnit,
) {
    tracing::trace!(
        peer = %unit.peer,
        block = %unit.block.cid(),
        "sending block"
    );

    // The ledger tracks what we handed out, whether or not the send
    // below gets through.
    if let Err(err) = engine.message_sent(
        unit.peer.clone(),
        BlockMessage::single(unit.block.clone()),
    ) {
        tracing::warn!(?err, peer = %unit.peer, "could not update ledger");
    }

    let len = unit.block.len();
    want_manager.send_block(scope.clone(), unit).await;

    counters.record_sent(len);
}
