//! The in-memory stub network provided by blockswap.

use blockswap_api::{scope::CancellationToken, *};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    providers: HashMap<ContentId, Vec<PeerId>>,
    unreachable: HashSet<PeerId>,
    lookups: Vec<ContentId>,
    running_lookups: HashMap<ContentId, usize>,
    max_running_lookups: HashMap<ContentId, usize>,
    connected: Vec<PeerId>,
    lookup_delay: Duration,
    connect_delay: Duration,
    hold_lookups_open: bool,
}

/// An in-memory network with a static provider table.
/// This is NOT a production module. It is for testing only.
#[derive(Debug, Default)]
pub struct MemNetwork {
    state: Arc<Mutex<State>>,
}

impl MemNetwork {
    /// Construct a new MemNetwork.
    pub fn create() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Advertise `peer` as a provider of `key`.
    pub fn add_provider(&self, key: ContentId, peer: PeerId) {
        self.state
            .lock()
            .unwrap()
            .providers
            .entry(key)
            .or_default()
            .push(peer);
    }

    /// Make connection attempts to `peer` fail.
    pub fn set_unreachable(&self, peer: PeerId) {
        self.state.lock().unwrap().unreachable.insert(peer);
    }

    /// Delay before each provider is yielded by a lookup.
    pub fn set_lookup_delay(&self, delay: Duration) {
        self.state.lock().unwrap().lookup_delay = delay;
    }

    /// Delay before each connection attempt concludes.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state.lock().unwrap().connect_delay = delay;
    }

    /// Keep lookups open after the last provider, until their scope is
    /// cancelled, like a slow network lookup that never concludes.
    pub fn set_hold_lookups_open(&self, hold: bool) {
        self.state.lock().unwrap().hold_lookups_open = hold;
    }

    /// Keys looked up so far, in call order.
    pub fn lookups(&self) -> Vec<ContentId> {
        self.state.lock().unwrap().lookups.clone()
    }

    /// Number of lookups for `key` currently running.
    pub fn running_lookups(&self, key: &ContentId) -> usize {
        self.state
            .lock()
            .unwrap()
            .running_lookups
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    /// The highest number of lookups for `key` ever running at once.
    pub fn max_running_lookups(&self, key: &ContentId) -> usize {
        self.state
            .lock()
            .unwrap()
            .max_running_lookups
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    /// Peers successfully connected to, in completion order.
    pub fn connected(&self) -> Vec<PeerId> {
        self.state.lock().unwrap().connected.clone()
    }
}

impl Network for MemNetwork {
    fn find_providers(
        &self,
        scope: CancellationToken,
        key: ContentId,
        max: usize,
    ) -> ProviderRecv {
        let (send, recv) = tokio::sync::mpsc::channel(max.max(1));

        let (providers, delay, hold) = {
            let mut lock = self.state.lock().unwrap();
            lock.lookups.push(key.clone());
            let running = lock.running_lookups.entry(key.clone()).or_default();
            *running += 1;
            let running = *running;
            let max_running =
                lock.max_running_lookups.entry(key.clone()).or_default();
            *max_running = (*max_running).max(running);
            let providers = lock
                .providers
                .get(&key)
                .map(|p| p.iter().take(max).cloned().collect::<Vec<_>>())
                .unwrap_or_default();
            (providers, lock.lookup_delay, lock.hold_lookups_open)
        };

        let state = self.state.clone();
        tokio::task::spawn(async move {
            'lookup: {
                for peer in providers {
                    tokio::select! {
                        _ = scope.cancelled() => break 'lookup,
                        _ = tokio::time::sleep(delay) => (),
                    }
                    if send.send(peer).await.is_err() {
                        break 'lookup;
                    }
                }
                if hold {
                    scope.cancelled().await;
                }
            }

            drop(send);
            if let Some(running) =
                state.lock().unwrap().running_lookups.get_mut(&key)
            {
                *running -= 1;
            }
        });

        recv
    }

    fn connect_to(
        &self,
        scope: CancellationToken,
        peer: PeerId,
    ) -> BoxFut<'_, BsResult<()>> {
        Box::pin(async move {
            let delay = self.state.lock().unwrap().connect_delay;
            tokio::select! {
                _ = scope.cancelled() => return Err(BsError::Cancelled),
                _ = tokio::time::sleep(delay) => (),
            }

            let mut lock = self.state.lock().unwrap();
            if lock.unreachable.contains(&peer) {
                return Err(BsError::other(format!("peer {peer} unreachable")));
            }
            lock.connected.push(peer);
            Ok(())
        })
    }
}
