//! Factories for generating instances of blockswap modules.

pub mod core_workers;
pub use core_workers::CoreWorkersFactory;

mod mem_engine;
pub use mem_engine::*;

mod mem_want_manager;
pub use mem_want_manager::*;

mod mem_network;
pub use mem_network::*;
