//! # Execution Engine
//!
//! The attempt loop shared by every transaction and query.
//!
//! ```text
//! SELECT_NODE ──► SEND ──► CLASSIFY ──┬── Finished ──► record_success, return
//!      ▲            │                  ├── Retry ─────► (node fault? record_failure), sleep
//!      │            │ transport error  └── Error ─────► return, node untouched
//!      │            ▼
//!      └──── record_failure
//! ```
//!
//! The loop is bounded by `max_attempts`, never by wall-clock time. Each
//! send is bounded by `request_timeout`; a timeout or an undecodable reply
//! is a transport failure. A channel the client's own settings cannot open
//! ends the call without touching the node.

mod settings;

pub use settings::{
    ExecuteSettings, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF, DEFAULT_MIN_BACKOFF,
    DEFAULT_REQUEST_TIMEOUT,
};

use ledger_telemetry::metrics::{
    ATTEMPTS, ATTEMPTS_EXHAUSTED, NODE_FAILURES, REJECTIONS, REQUEST_DURATION, RETRIES,
};
use ledger_telemetry::{log_node_event, metric_inc, metric_observe};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{
    AccountId, AttemptCause, Result, SdkError, Status, TransactionId, TransportError,
};
use crate::network::Network;
use crate::ports::TimeSource;
use crate::wire::{self, Request, Response};

/// Outcome of classifying one response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptResult {
    /// Final answer; the node is credited
    Finished,
    /// Transient condition; try again after a backoff
    Retry,
    /// Deterministic rejection; surfaced immediately
    Error,
}

/// An operation the engine can run against the network.
pub trait Executable: Send + Sync {
    /// Value produced on success.
    type Output: Send;

    /// Operation name for logs and metrics.
    fn name(&self) -> &str;

    /// Nodes the operation may be sent to. Empty means any node.
    fn candidate_nodes(&self) -> &[AccountId];

    /// Node every attempt must go to, for follow-up polls.
    fn pinned_node(&self) -> Option<AccountId> {
        None
    }

    /// Transaction the operation concerns, for error reporting.
    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    /// Per-operation override of the client's settings.
    fn settings(&self) -> Option<&ExecuteSettings> {
        None
    }

    /// Request to send to `node` on this attempt.
    fn make_request(&self, node: &AccountId) -> Result<Request>;

    /// Decide what a response means.
    fn classify(&self, response: &Response) -> AttemptResult;

    /// Whether a retryable response is the node's fault.
    fn is_node_fault(&self, response: &Response) -> bool {
        response.precheck.is_node_fault()
    }

    /// Status reported for a response in errors and logs.
    fn response_status(&self, response: &Response) -> Status {
        response.precheck
    }

    /// Turn a finished response into the output.
    fn make_output(&self, response: Response, node: &AccountId) -> Result<Self::Output>;

    /// Turn a rejected response into an error.
    fn make_error(&self, response: &Response, node: &AccountId) -> SdkError {
        SdkError::PrecheckRejection {
            status: self.response_status(response),
            transaction_id: self.transaction_id(),
            node: node.clone(),
        }
    }
}

/// Run `executable` until it finishes, is rejected, or runs out of attempts.
pub async fn execute<E>(
    network: &Network,
    time: &dyn TimeSource,
    executable: &E,
    settings: &ExecuteSettings,
) -> Result<E::Output>
where
    E: Executable + ?Sized,
{
    settings.validate()?;
    let operation = executable.name();
    let candidates = executable.candidate_nodes();
    let mut last_node: Option<AccountId> = None;
    let mut last_cause: Option<AttemptCause> = None;

    for attempt in 0..settings.max_attempts {
        let now = time.now();
        let node = match executable.pinned_node() {
            Some(pinned) => network
                .node(&pinned)
                .ok_or(SdkError::UnknownNode(pinned))?,
            None => network.select_node(candidates, now)?,
        };
        let node_id = node.account_id().clone();
        node.record_use(now);
        last_node = Some(node_id.clone());

        metric_inc!(ATTEMPTS, &[operation]);
        debug!(
            operation,
            node = %node_id,
            attempt = attempt + 1,
            max_attempts = settings.max_attempts,
            "Sending attempt"
        );

        let request = wire::encode_request(&executable.make_request(&node_id)?)?;
        let started = Instant::now();
        let sent = tokio::time::timeout(settings.request_timeout, async {
            let channel = network.channel(&node).await?;
            channel.send(request).await
        })
        .await
        .unwrap_or_else(|_| Err(TransportError::Timeout(settings.request_timeout)));
        metric_observe!(
            REQUEST_DURATION,
            &[operation],
            started.elapsed().as_secs_f64()
        );

        let bytes = match sent {
            Ok(bytes) => bytes,
            Err(error) if error.is_client_side() => {
                warn!(
                    operation,
                    node = %node_id,
                    error = %error,
                    "Channel unusable with client settings"
                );
                return Err(SdkError::Transport(error));
            }
            Err(error) => {
                let backoff = node.record_failure(time.now());
                metric_inc!(NODE_FAILURES, &[node_id.to_string().as_str()]);
                metric_inc!(RETRIES, &[operation, "transport"]);
                log_node_event!(
                    warn,
                    "Transport failure, node benched",
                    node_id,
                    operation,
                    attempt = attempt + 1,
                    backoff = ?backoff,
                    error = %error
                );
                last_cause = Some(AttemptCause::Transport(error));
                continue;
            }
        };

        let response = match wire::decode_response(&bytes) {
            Ok(response) => response,
            Err(error) => {
                let backoff = node.record_failure(time.now());
                metric_inc!(NODE_FAILURES, &[node_id.to_string().as_str()]);
                metric_inc!(RETRIES, &[operation, "malformed"]);
                log_node_event!(
                    warn,
                    "Undecodable response, node benched",
                    node_id,
                    operation,
                    attempt = attempt + 1,
                    backoff = ?backoff,
                    error = %error
                );
                last_cause = Some(AttemptCause::Transport(TransportError::Io(
                    error.to_string(),
                )));
                continue;
            }
        };
        match executable.classify(&response) {
            AttemptResult::Finished => {
                node.record_success();
                debug!(operation, node = %node_id, attempt = attempt + 1, "Attempt finished");
                return executable.make_output(response, &node_id);
            }
            AttemptResult::Retry => {
                let status = executable.response_status(&response);
                let reason = if executable.is_node_fault(&response) {
                    node.record_failure(time.now());
                    metric_inc!(NODE_FAILURES, &[node_id.to_string().as_str()]);
                    "node_fault"
                } else {
                    "not_yet_available"
                };
                metric_inc!(RETRIES, &[operation, reason]);
                last_cause = Some(AttemptCause::Status(status));

                if attempt + 1 < settings.max_attempts {
                    let delay = settings.backoff_for(attempt);
                    debug!(
                        operation,
                        node = %node_id,
                        status = %status,
                        delay = ?delay,
                        "Retryable status, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
            AttemptResult::Error => {
                let error = executable.make_error(&response, &node_id);
                let status = executable.response_status(&response);
                metric_inc!(REJECTIONS, &[status.as_str()]);
                debug!(operation, node = %node_id, status = %status, "Deterministic rejection");
                return Err(error);
            }
        }
    }

    metric_inc!(ATTEMPTS_EXHAUSTED, &[operation]);
    warn!(
        operation,
        attempts = settings.max_attempts,
        last_node = ?last_node,
        "Attempt budget exhausted"
    );
    Err(SdkError::AttemptsExhausted {
        attempts: settings.max_attempts,
        last_node,
        last_cause,
    })
}
