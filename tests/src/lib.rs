//! # Ledger SDK Test Suite
//!
//! Cross-crate tests that drive the SDK only through its public API.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── client_flows.rs    # Transfers, receipts, failover over scripted nodes
//!     ├── concurrency.rs     # Shared client under concurrent callers
//!     ├── tcp_transport.rs   # Real TCP node and mirror on loopback
//!     └── config_flows.rs    # Client built from a TOML file
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo bench -p ledger-tests
//! ```

pub mod integration;
