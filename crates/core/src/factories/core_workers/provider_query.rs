use super::active_set::{ActiveClaim, ActiveSet};
use super::config::CoreWorkersConfig;
use blockswap_api::{scope::CancellationToken, *};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::Instrument;

#[derive(Debug, Clone)]
pub(super) struct ProviderQueryConfig {
    pub provider_request_timeout: Duration,
    pub max_providers_per_request: usize,
    /// `None` means no limit.
    pub max_concurrent_connects: Option<usize>,
}

impl From<&CoreWorkersConfig> for ProviderQueryConfig {
    fn from(config: &CoreWorkersConfig) -> Self {
        Self {
            provider_request_timeout: config.provider_request_timeout(),
            max_providers_per_request: config.max_providers_per_request
                as usize,
            max_concurrent_connects: match config.max_concurrent_connects {
                0 => None,
                n => Some(n as usize),
            },
        }
    }
}

/// Admit discovery requests from the intake queue, at most one discovery
/// per key at a time, until `scope` is cancelled.
pub(super) async fn provider_query_manager(
    config: ProviderQueryConfig,
    scope: CancellationToken,
    mut intake: IntakeRecv,
    active: Arc<ActiveSet>,
    network: DynNetwork,
) {
    let mut discoveries = JoinSet::new();

    loop {
        let request = tokio::select! {
            biased;
            _ = scope.cancelled() => break,
            // reap finished discoveries
            Some(_) = discoveries.join_next(), if !discoveries.is_empty() => {
                continue
            }
            request = intake.recv() => match request {
                Some(request) => request,
                None => {
                    tracing::debug!("discovery intake closed");
                    break;
                }
            },
        };

        // make sure it's not already cancelled
        if request.scope.is_cancelled() {
            tracing::trace!(
                key = %request.key,
                "dropping cancelled discovery request"
            );
            continue;
        }

        let Some(claim) = active.try_claim(&request.key) else {
            tracing::trace!(
                key = %request.key,
                "discovery already in progress"
            );
            continue;
        };

        let span = tracing::debug_span!("discover", key = %request.key);
        discoveries.spawn(
            discover(
                config.clone(),
                request.scope,
                scope.clone(),
                claim,
                network.clone(),
            )
            .instrument(span),
        );
    }

    // In-flight discoveries also observe the cancelled manager scope, so
    // this only waits for them to wind down and release their keys.
    while discoveries.join_next().await.is_some() {}

    tracing::debug!("provider query manager shutting down");
}

/// Look up providers for the claimed key and try to connect to each one.
/// The key is released when the claim drops at the end.
async fn discover(
    config: ProviderQueryConfig,
    request_scope: CancellationToken,
    manager_scope: CancellationToken,
    claim: ActiveClaim,
    network: DynNetwork,
) {
    let joined = scope::joined(&request_scope, &manager_scope);
    let _guard = joined.clone().drop_guard();
    let lookup_scope =
        scope::with_timeout(&joined, config.provider_request_timeout);

    let mut providers = network.find_providers(
        lookup_scope.clone(),
        claim.key().clone(),
        config.max_providers_per_request,
    );

    let limit = config
        .max_concurrent_connects
        .map(|n| Arc::new(Semaphore::new(n)));

    let mut connects = JoinSet::new();
    while connects.len() < config.max_providers_per_request {
        let peer = tokio::select! {
            biased;
            _ = lookup_scope.cancelled() => break,
            peer = providers.recv() => match peer {
                Some(peer) => peer,
                None => break,
            },
        };

        connects.spawn(connect(
            lookup_scope.clone(),
            limit.clone(),
            network.clone(),
            peer,
        ));
    }

    let found = connects.len();
    let mut connected = 0;
    while let Some(res) = connects.join_next().await {
        if let Ok(ConnectOutcome::Connected) = res {
            connected += 1;
        }
    }

    tracing::debug!(providers = found, connected, "discovery complete");
    drop(claim);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectOutcome {
    Connected,
    Failed,
    /// The scope ended first. Not a failure.
    Abandoned,
}

async fn connect(
    scope: CancellationToken,
    limit: Option<Arc<Semaphore>>,
    network: DynNetwork,
    peer: PeerId,
) -> ConnectOutcome {
    let _permit = match limit {
        None => None,
        Some(limit) => tokio::select! {
            biased;
            _ = scope.cancelled() => return ConnectOutcome::Abandoned,
            permit = limit.acquire_owned() => match permit {
                Ok(permit) => Some(permit),
                Err(_) => return ConnectOutcome::Abandoned,
            },
        },
    };

    match network.connect_to(scope, peer.clone()).await {
        Ok(()) => ConnectOutcome::Connected,
        Err(err) if err.is_cancelled() => {
            tracing::trace!(%peer, "connect abandoned");
            ConnectOutcome::Abandoned
        }
        Err(err) => {
            tracing::debug!(?err, %peer, "failed to connect to provider");
            ConnectOutcome::Failed
        }
    }
}
