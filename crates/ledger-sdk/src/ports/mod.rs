//! # Ports Module
//!
//! Outbound dependencies of the engine: transport channels, signing, time and
//! the mirror stream. Concrete implementations live in `adapters`.

pub mod outbound;

pub use outbound::*;
