//! End-to-end flows.

pub mod client_flows;
pub mod concurrency;
pub mod config_flows;
pub mod support;
pub mod tcp_transport;
