//! # Managed Nodes
//!
//! Per-node health record with exponential backoff.
//!
//! ## Backoff Model
//!
//! - A failure doubles the node's backoff (capped) and benches it until
//!   `now + backoff`
//! - A success halves the backoff (floored) but leaves any pending readmit
//!   time to expire on its own, so a recovering node heals gradually
//! - A node is healthy iff it has no readmit time or that time has passed

// Semantic submodules
mod config;
mod node;

// Re-export public API
pub use config::{BackoffConfig, DEFAULT_NODE_MAX_BACKOFF, DEFAULT_NODE_MIN_BACKOFF};
pub use node::{ManagedNode, NodeStats};
