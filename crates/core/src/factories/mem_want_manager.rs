//! The in-memory stub want manager provided by blockswap.

use blockswap_api::{scope::CancellationToken, *};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An in-memory want manager.
/// This is NOT a production module. It is for testing only.
///
/// It keeps an ordered want-list and "sends" blocks by recording them,
/// optionally after a delay.
#[derive(Debug, Default)]
pub struct MemWantManager {
    wants: Mutex<Vec<WantEntry>>,
    sent: Mutex<Vec<DeliveryUnit>>,
    send_delay: Mutex<Option<Duration>>,
}

impl MemWantManager {
    /// Construct a new MemWantManager.
    pub fn create() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add `cid` to the want-list, or update its priority.
    pub fn want(&self, cid: ContentId, priority: i32) {
        let mut lock = self.wants.lock().unwrap();
        match lock.iter_mut().find(|e| e.cid == cid) {
            Some(entry) => entry.priority = priority,
            None => lock.push(WantEntry::new(cid, priority)),
        }
    }

    /// Remove `cid` from the want-list.
    pub fn cancel_want(&self, cid: &ContentId) {
        self.wants.lock().unwrap().retain(|e| &e.cid != cid);
    }

    /// Make every following send take `delay`. A send whose scope is
    /// cancelled before the delay has elapsed is abandoned.
    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    /// The units sent so far, in completion order.
    pub fn sent(&self) -> Vec<DeliveryUnit> {
        self.sent.lock().unwrap().clone()
    }
}

impl WantManager for MemWantManager {
    fn send_block(
        &self,
        scope: CancellationToken,
        unit: DeliveryUnit,
    ) -> BoxFut<'_, ()> {
        Box::pin(async move {
            let delay = *self.send_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::select! {
                    _ = scope.cancelled() => {
                        tracing::debug!(peer = %unit.peer, "send abandoned");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => (),
                }
            }
            self.sent.lock().unwrap().push(unit);
        })
    }

    fn want_count(&self) -> usize {
        self.wants.lock().unwrap().len()
    }

    fn want_entries(&self) -> Vec<WantEntry> {
        self.wants.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use blockswap_test_utils::{
        block::random_block,
        id::{random_content_id, random_peer_id},
    };

    #[test]
    fn want_list_snapshot() {
        let wm = MemWantManager::create();
        let a = random_content_id();
        let b = random_content_id();
        wm.want(a.clone(), 1);
        wm.want(b.clone(), 1);
        wm.want(a.clone(), 5);
        assert_eq!(2, wm.want_count());
        assert_eq!(
            vec![WantEntry::new(a.clone(), 5), WantEntry::new(b.clone(), 1)],
            wm.want_entries()
        );

        wm.cancel_want(&a);
        assert_eq!(vec![WantEntry::new(b, 1)], wm.want_entries());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_send_respects_scope() {
        let wm = MemWantManager::create();
        wm.set_send_delay(Duration::from_secs(5));
        let unit = DeliveryUnit::new(random_peer_id(), random_block(8));

        wm.send_block(CancellationToken::new(), unit.clone()).await;
        assert_eq!(vec![unit.clone()], wm.sent());

        let scope = CancellationToken::new();
        scope.cancel();
        wm.send_block(scope, unit).await;
        assert_eq!(1, wm.sent().len());
    }
}
