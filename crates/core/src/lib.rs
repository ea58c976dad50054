#![deny(missing_docs)]
//! Blockswap worker subsystem.
//!
//! Drains the engine outbox with a pool of task workers, periodically
//! re-announces unresolved wants and runs deduplicated, cancellable
//! provider discovery.

use blockswap_api::*;

/// Construct the production worker factory.
pub fn default_workers_factory() -> DynWorkersFactory {
    factories::CoreWorkersFactory::create()
}

pub mod factories;
