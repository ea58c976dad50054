use blockswap_api::{scope::CancellationToken, *};
use rand::seq::SliceRandom;
use std::time::Duration;
use tokio::time::Instant;

/// How often the size of the want-list is logged.
pub(super) const WANT_LIST_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Periodically submit one random want-list entry for provider discovery.
pub(super) async fn rebroadcast_worker(
    parent: CancellationToken,
    want_manager: DynWantManager,
    delay: RebroadcastDelay,
    intake: IntakeSend,
) {
    // Requests submitted from here live as long as this worker.
    let scope = parent.child_token();
    let _guard = scope.clone().drop_guard();

    let mut log_tick = tokio::time::interval_at(
        Instant::now() + WANT_LIST_LOG_INTERVAL,
        WANT_LIST_LOG_INTERVAL,
    );
    let broadcast = tokio::time::sleep(delay.get());
    tokio::pin!(broadcast);

    loop {
        tokio::select! {
            biased;
            _ = parent.cancelled() => break,
            _ = log_tick.tick() => {
                let count = want_manager.want_count();
                if count > 0 {
                    tracing::debug!(count, "keys in want-list");
                }
            }
            _ = &mut broadcast => {
                // the delay may have been changed since the last tick
                broadcast.as_mut().reset(Instant::now() + delay.get());

                let entries = want_manager.want_entries();
                // TODO: pick keys by want age or priority instead of
                // sampling a single random one per tick.
                let key = pick_one(&entries, &mut rand::thread_rng());
                let Some(key) = key else {
                    continue;
                };

                tracing::trace!(%key, "rebroadcasting want");
                let request = DiscoveryRequest::new(key, scope.clone());
                // While the intake is full the want-list log tick waits too.
                tokio::select! {
                    biased;
                    _ = parent.cancelled() => break,
                    res = intake.send(request) => {
                        if res.is_err() {
                            tracing::debug!("discovery intake closed");
                        }
                    }
                }
            }
        }
    }

    tracing::debug!("rebroadcast worker shutting down");
}

/// Choose one entry uniformly at random.
pub(super) fn pick_one<R: rand::Rng + ?Sized>(
    entries: &[WantEntry],
    rng: &mut R,
) -> Option<ContentId> {
    entries.choose(rng).map(|entry| entry.cid.clone())
}
