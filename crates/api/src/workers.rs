//! Blockswap worker subsystem types.
//!
//! The workers drain the engine outbox, periodically re-announce
//! unresolved wants and run deduplicated provider discovery.

use crate::{config::Config, scope::CancellationToken, *};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Send statistics of the task workers.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    /// Number of blocks handed to the want manager for sending.
    pub blocks_sent: u64,

    /// Total raw bytes of those blocks.
    pub data_sent: u64,
}

/// The rebroadcast period, adjustable while the workers are running.
///
/// Clones share the same value. The rebroadcast worker re-reads it
/// every cycle, so a change takes effect after the pending tick.
#[derive(Debug, Clone)]
pub struct RebroadcastDelay(Arc<AtomicU64>);

impl RebroadcastDelay {
    /// Construct a new delay.
    pub fn new(delay: Duration) -> Self {
        Self(Arc::new(AtomicU64::new(delay.as_millis() as u64)))
    }

    /// Get the current delay.
    pub fn get(&self) -> Duration {
        Duration::from_millis(self.0.load(Ordering::Relaxed))
    }

    /// Set a new delay. Values below one millisecond are raised to one.
    pub fn set(&self, delay: Duration) {
        self.0
            .store((delay.as_millis() as u64).max(1), Ordering::Relaxed);
    }
}

/// A running worker subsystem.
pub trait Workers: 'static + Send + Sync + std::fmt::Debug {
    /// Submit a provider discovery request for `key` to the intake queue.
    ///
    /// Admission is best-effort: the request is dropped if `scope` is
    /// cancelled before it is admitted, or if a discovery for `key` is
    /// already running. Only a closed intake queue is reported as an error.
    fn find_providers(
        &self,
        key: ContentId,
        scope: CancellationToken,
    ) -> BoxFut<'_, BsResult<()>>;

    /// A sender for the intake queue, for components that want to submit
    /// discovery requests directly.
    fn intake(&self) -> IntakeSend;

    /// The current send statistics.
    fn stat(&self) -> Stat;

    /// Number of keys with a discovery currently in progress.
    fn active_discovery_count(&self) -> usize;

    /// The runtime rebroadcast delay.
    fn rebroadcast_delay(&self) -> RebroadcastDelay;

    /// Cancel the lifecycle scope and wait for every worker to exit.
    fn shutdown(&self) -> BoxFut<'_, ()>;
}

/// Trait-object [Workers].
pub type DynWorkers = Arc<dyn Workers>;

/// A factory for constructing [Workers] instances.
pub trait WorkersFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut Config) -> BsResult<()>;

    /// Validate configuration.
    fn validate_config(&self, config: &Config) -> BsResult<()>;

    /// Spawn the workers under `scope`. Must be called from within a
    /// tokio runtime.
    fn create(
        &self,
        config: &Config,
        scope: CancellationToken,
        engine: DynEngine,
        want_manager: DynWantManager,
        network: DynNetwork,
    ) -> BsResult<DynWorkers>;
}

/// Trait-object [WorkersFactory].
pub type DynWorkersFactory = Arc<dyn WorkersFactory>;
