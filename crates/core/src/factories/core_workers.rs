//! The core worker subsystem of blockswap.
//!
//! It consists of multiple parts, all spawned under one lifecycle scope:
//! - A provider query manager task that admits discovery requests
//! - A pool of task workers that send blocks scheduled by the engine
//! - A rebroadcast task that re-announces unresolved wants
//!
//! ### Provider query manager
//!
//! A channel acts as the intake queue for [DiscoveryRequest]s. The manager
//! receives requests one by one:
//!
//! - Requests whose scope is already cancelled are dropped.
//! - The key is claimed in the set of active discoveries. If another
//!   discovery already owns the key, the request is dropped.
//! - Otherwise a discovery task is spawned, so a slow lookup never blocks
//!   the intake. It asks the network for providers on a scope bounded by
//!   the provider request timeout, fans out a connection attempt to every
//!   provider found, waits for all of them and finally releases the key.
//!
//! ### Task workers
//!
//! The engine publishes per-peer delivery channels on its outbox. Each
//! worker awaits the next channel, takes the unit it carries, records the
//! outgoing message in the engine ledger, hands the block to the want
//! manager for sending and updates the send statistics. A channel that
//! closes without a unit is skipped.
//!
//! ### Rebroadcast
//!
//! Every rebroadcast period one random entry of the want-list is submitted
//! to the intake queue, so that providers are searched for again for
//! blocks that are still missing. Every 10 s the size of the want-list is
//! logged.

use blockswap_api::{config::Config, scope::CancellationToken, *};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::Instrument;

mod active_set;
mod counters;
mod provider_query;
mod rebroadcast;
mod task_worker;

use active_set::ActiveSet;
use counters::Counters;

/// CoreWorkers configuration types.
pub mod config {
    use std::time::Duration;

    /// Configuration parameters for [CoreWorkersFactory](super::CoreWorkersFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct CoreWorkersConfig {
        /// How many task workers send blocks in parallel. Default: 8.
        pub task_worker_count: u32,

        /// Initial period between want-list rebroadcasts. The period can
        /// be changed at runtime through
        /// [Workers::rebroadcast_delay](blockswap_api::Workers::rebroadcast_delay).
        /// Default: 1 min.
        pub default_rebroadcast_interval_ms: u32,

        /// How long a single provider discovery, including the connection
        /// attempts, may take. Default: 10 s.
        pub provider_request_timeout_ms: u32,

        /// Maximum number of providers considered per discovery. Default: 3.
        pub max_providers_per_request: u32,

        /// Maximum number of concurrent connection attempts per discovery.
        /// `0` means no limit. Default: 0.
        pub max_concurrent_connects: u32,

        /// Capacity of the discovery intake queue. Default: 32.
        pub intake_queue_size: u32,
    }

    impl Default for CoreWorkersConfig {
        fn default() -> Self {
            Self {
                task_worker_count: 8,
                default_rebroadcast_interval_ms: 1000 * 60,
                provider_request_timeout_ms: 1000 * 10,
                max_providers_per_request: 3,
                max_concurrent_connects: 0,
                intake_queue_size: 32,
            }
        }
    }

    impl CoreWorkersConfig {
        /// Get the initial rebroadcast interval.
        pub fn default_rebroadcast_interval(&self) -> Duration {
            Duration::from_millis(self.default_rebroadcast_interval_ms as u64)
        }

        /// Get the provider request timeout.
        pub fn provider_request_timeout(&self) -> Duration {
            Duration::from_millis(self.provider_request_timeout_ms as u64)
        }
    }

    /// Module-level configuration for CoreWorkers.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    pub struct CoreWorkersModConfig {
        /// CoreWorkers configuration.
        pub core_workers: CoreWorkersConfig,
    }

    impl blockswap_api::config::ModConfig for CoreWorkersModConfig {}
}

pub use config::*;

/// The production worker factory.
#[derive(Debug)]
pub struct CoreWorkersFactory {}

impl CoreWorkersFactory {
    /// Construct a new CoreWorkersFactory.
    pub fn create() -> DynWorkersFactory {
        let out: DynWorkersFactory = Arc::new(CoreWorkersFactory {});
        out
    }
}

impl WorkersFactory for CoreWorkersFactory {
    fn default_config(&self, config: &mut Config) -> BsResult<()> {
        config.set_module_config(&CoreWorkersModConfig::default())
    }

    fn validate_config(&self, config: &Config) -> BsResult<()> {
        let config: CoreWorkersModConfig = config.get_module_config()?;
        validate(&config.core_workers)
    }

    fn create(
        &self,
        config: &Config,
        scope: CancellationToken,
        engine: DynEngine,
        want_manager: DynWantManager,
        network: DynNetwork,
    ) -> BsResult<DynWorkers> {
        let config: CoreWorkersModConfig = config.get_module_config()?;
        validate(&config.core_workers)?;
        let out: DynWorkers = Arc::new(CoreWorkers::spawn(
            config.core_workers,
            scope,
            engine,
            want_manager,
            network,
        ));
        Ok(out)
    }
}

fn validate(config: &CoreWorkersConfig) -> BsResult<()> {
    let checks = [
        (config.task_worker_count, "taskWorkerCount"),
        (
            config.default_rebroadcast_interval_ms,
            "defaultRebroadcastIntervalMs",
        ),
        (config.provider_request_timeout_ms, "providerRequestTimeoutMs"),
        (config.max_providers_per_request, "maxProvidersPerRequest"),
        (config.intake_queue_size, "intakeQueueSize"),
    ];
    for (value, name) in checks {
        if value == 0 {
            return Err(BsError::other(format!(
                "invalid core workers config: {name} must be greater than 0"
            )));
        }
    }
    Ok(())
}

/// The running worker subsystem.
///
/// Dropping it cancels the lifecycle scope and aborts all worker tasks.
/// Prefer [Workers::shutdown] to let the workers exit on their own.
#[derive(Debug)]
pub struct CoreWorkers {
    scope: CancellationToken,
    intake_send: IntakeSend,
    active: Arc<ActiveSet>,
    counters: Arc<Counters>,
    rebroadcast_delay: RebroadcastDelay,
    tasks: Mutex<Option<JoinSet<()>>>,
}

impl Drop for CoreWorkers {
    fn drop(&mut self) {
        self.scope.cancel();
        if let Some(tasks) = self.tasks.lock().unwrap().as_mut() {
            tasks.abort_all();
        }
    }
}

impl CoreWorkers {
    /// Spawn the provider query manager, the task workers and the
    /// rebroadcast worker under `scope`. Returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        config: CoreWorkersConfig,
        scope: CancellationToken,
        engine: DynEngine,
        want_manager: DynWantManager,
        network: DynNetwork,
    ) -> Self {
        let (intake_send, intake_recv) =
            tokio::sync::mpsc::channel(config.intake_queue_size as usize);
        let active = Arc::new(ActiveSet::default());
        let counters = Arc::new(Counters::default());
        let rebroadcast_delay =
            RebroadcastDelay::new(config.default_rebroadcast_interval());

        let mut tasks = JoinSet::new();

        tasks.spawn(provider_query::provider_query_manager(
            provider_query::ProviderQueryConfig::from(&config),
            scope.clone(),
            intake_recv,
            active.clone(),
            network,
        ));

        for id in 0..config.task_worker_count {
            tasks.spawn(
                task_worker::task_worker(
                    scope.clone(),
                    engine.clone(),
                    want_manager.clone(),
                    counters.clone(),
                )
                .instrument(tracing::debug_span!("task_worker", id)),
            );
        }

        tasks.spawn(rebroadcast::rebroadcast_worker(
            scope.clone(),
            want_manager,
            rebroadcast_delay.clone(),
            intake_send.clone(),
        ));

        tracing::info!(
            task_workers = config.task_worker_count,
            "blockswap workers started"
        );

        Self {
            scope,
            intake_send,
            active,
            counters,
            rebroadcast_delay,
            tasks: Mutex::new(Some(tasks)),
        }
    }
}

impl Workers for CoreWorkers {
    fn find_providers(
        &self,
        key: ContentId,
        scope: CancellationToken,
    ) -> BoxFut<'_, BsResult<()>> {
        Box::pin(async move {
            self.intake_send
                .send(DiscoveryRequest::new(key, scope))
                .await
                .map_err(|_| BsError::other("discovery intake closed"))
        })
    }

    fn intake(&self) -> IntakeSend {
        self.intake_send.clone()
    }

    fn stat(&self) -> Stat {
        self.counters.snapshot()
    }

    fn active_discovery_count(&self) -> usize {
        self.active.len()
    }

    fn rebroadcast_delay(&self) -> RebroadcastDelay {
        self.rebroadcast_delay.clone()
    }

    fn shutdown(&self) -> BoxFut<'_, ()> {
        Box::pin(async move {
            self.scope.cancel();
            let tasks = self.tasks.lock().unwrap().take();
            if let Some(mut tasks) = tasks {
                while let Some(res) = tasks.join_next().await {
                    if let Err(err) = res {
                        if err.is_panic() {
                            tracing::error!(?err, "blockswap worker panicked");
                        }
                    }
                }
            }
            tracing::info!("blockswap workers stopped");
        })
    }
}

#[cfg(test)]
mod test;
