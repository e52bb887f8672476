//! # hebbnet
//!
//! A region-structured neural network playground with reward-modulated
//! Hebbian learning.
//!
//! This crate provides a tick-driven network of leaky threshold neurons
//! grouped into named regions around a central hub, with pulse-based signal
//! propagation, eligibility traces, and a trial loop that trains an output
//! competition through global reward broadcasts. No matrices, no backprop.
//!
//! ## Quick Start
//!
//! ```
//! use hebbnet::prelude::*;
//!
//! // Create a simulation with the stock six-region layout
//! let cfg = SimConfig::default().with_seed(42);
//! let mut sim = Simulation::new(cfg).expect("default config is valid");
//!
//! // Nudge the input region and run a few seconds of ticks
//! sim.stimulate_region("sensory", 1.0).expect("region exists");
//! sim.play();
//! for _ in 0..240 {
//!     sim.step();
//! }
//!
//! // Read everything through a detached snapshot
//! let snap = SimSnapshot::capture(&sim);
//! assert_eq!(snap.tick, 240);
//! assert!(snap.stats.total_signals > 0);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `serde` (default): Enable serialization of configs and snapshots
//!
//! ## no_std Support
//!
//! Disable default features for `no_std` environments:
//! ```toml
//! hebbnet = { version = "0.1", default-features = false }
//! ```
//!
//! ## Modules
//!
//! - [`network`]: Regions, hub, neurons, connections, and the tick update
//! - [`trainer`]: Trial scheduling and reward broadcast
//! - [`sim`]: Simulation driver and control surface
//! - [`observer`]: Read-only observation adapters

// no_std support
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/sim.rs"]
pub mod sim;

#[path = "core/trainer.rs"]
pub mod trainer;

#[cfg(feature = "std")]
pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use hebbnet::prelude::*;
/// ```
pub mod prelude {
    pub use crate::network::{
        default_regions, Activity, Bounds, Connection, NetStats, Network, NetworkConfig, Neuron,
        NeuronId, Pulse, Region, RegionSpec, Weight, WeightStats, HUB_ID,
    };
    #[cfg(feature = "std")]
    pub use crate::observer::{SimAdapter, SimSnapshot};
    pub use crate::sim::{SimConfig, Simulation};
    pub use crate::trainer::{Trainer, TrainerConfig, TrialPhase, TrialResult};
}
