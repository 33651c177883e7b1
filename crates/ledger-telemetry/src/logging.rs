//! Structured log macros.
//!
//! Every engine event that concerns a node or a transaction carries the same
//! field names so log pipelines can index them:
//! - `node`: node account id (`0.0.3`)
//! - `tx_id`: transaction id (`0.0.1001@1700000000.000000000`)
//! - `operation`: the transaction/query kind

/// Log a node-related event with standard fields.
#[macro_export]
macro_rules! log_node_event {
    ($level:ident, $msg:expr, $node:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            node = %$node,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a transaction-related event with standard fields.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $msg:expr, $tx_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            tx_id = %$tx_id,
            $($($field)*,)?
            $msg
        )
    };
}
