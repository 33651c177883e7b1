//! # Network
//!
//! The set of consensus nodes a client talks to.
//!
//! ## Responsibilities
//!
//! | Concern | Where |
//! |---------|-------|
//! | Presets (mainnet, testnet, ...) | `preset` |
//! | Node registry and health | `registry::Network` |
//! | Node selection under partial failure | `Network::select_node` |
//! | One cached channel per node endpoint | `Network::channel` |
//! | Rebuilding with a new node list | `Network::rebuild` |

mod preset;
mod registry;

pub use preset::NetworkPreset;
pub use registry::{Network, NetworkOptions};
