//! # Topic Subscriptions
//!
//! Long-lived streams of topic messages from the network's mirror.
//!
//! A subscription runs on its own tokio task, outside the attempt loop. The
//! caller gets a [`SubscriptionHandle`] to cancel it or wait for it to end.
//! Cancellation is checked before every await, so an idle stream stops
//! promptly.
//!
//! ## Reconnects
//!
//! A failed connect or a stream error reconnects after
//! [`ExecuteSettings::backoff_for`], up to `max_attempts` consecutive
//! failures. Each reconnect resumes one nanosecond after the last delivered
//! consensus timestamp and asks only for the messages still owed under the
//! limit. A delivered message resets the failure count.

use std::sync::Arc;
use std::time::Duration;

use ledger_telemetry::metric_inc;
use ledger_telemetry::metrics::RETRIES;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::domain::{Result, SdkError, Timestamp, TopicId, TopicMessage, TopicQuery};
use crate::execute::ExecuteSettings;
use crate::ports::MirrorConnector;

const OPERATION: &str = "topic_subscription";

/// Parameters of a topic subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicMessageQuery {
    topic_id: TopicId,
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    limit: u64,
    settings: Option<ExecuteSettings>,
}

impl TopicMessageQuery {
    /// Every message of `topic_id` from now on.
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            start_time: None,
            end_time: None,
            limit: 0,
            settings: None,
        }
    }

    /// First consensus time to deliver (inclusive).
    pub fn set_start_time(mut self, start: Timestamp) -> Self {
        self.start_time = Some(start);
        self
    }

    /// Consensus time to stop at (exclusive).
    pub fn set_end_time(mut self, end: Timestamp) -> Self {
        self.end_time = Some(end);
        self
    }

    /// Stop after `limit` messages. Zero means unlimited.
    pub fn set_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Reconnect budget and backoff, instead of the client's.
    pub fn set_execute_settings(mut self, settings: ExecuteSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Topic followed.
    pub fn topic_id(&self) -> &TopicId {
        &self.topic_id
    }

    /// Start streaming, calling `handler` for each message in order.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`SdkError::Config`] if the client has no mirror connector or the
    ///   network no mirror address
    /// - [`SdkError::Subscription`] outside a tokio runtime
    pub fn subscribe<F>(&self, client: &Client, handler: F) -> Result<SubscriptionHandle>
    where
        F: FnMut(TopicMessage) + Send + 'static,
    {
        let connector = client
            .mirror()
            .ok_or_else(|| SdkError::Config("client has no mirror connector".into()))?;
        let address = client
            .network()
            .mirror_address()
            .map(str::to_string)
            .ok_or_else(|| SdkError::Config("network has no mirror address".into()))?;
        let settings = self.settings.unwrap_or(*client.execute_settings());
        settings.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| SdkError::Subscription(format!("no tokio runtime: {e}")))?;

        let (cancel, cancelled) = watch::channel(false);
        let stream = TopicStream {
            connector,
            address,
            query: TopicQuery {
                topic_id: self.topic_id.clone(),
                start_time: self.start_time,
                end_time: self.end_time,
                limit: self.limit,
            },
            settings,
        };
        info!(topic = %self.topic_id, mirror = %stream.address, "Subscribing");
        let task = runtime.spawn(stream.run(handler, cancelled));

        Ok(SubscriptionHandle {
            cancel,
            task: Some(task),
        })
    }
}

/// Control of a running subscription. Dropping it cancels the subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<Result<()>>>,
}

impl SubscriptionHandle {
    /// Ask the subscription to stop. No handler call starts after the task
    /// observes this.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// True once the subscription task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait up to `timeout` for the subscription to end.
    ///
    /// Returns the subscription's outcome the first time it ends; later
    /// calls return `Ok(())`.
    ///
    /// # Errors
    ///
    /// - [`SdkError::JoinTimeout`] if it is still running; the handle stays
    ///   usable
    /// - [`SdkError::Subscription`] if reconnects were exhausted or the task
    ///   panicked
    pub async fn join(&mut self, timeout: Duration) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let joined = tokio::time::timeout(timeout, task)
            .await
            .map_err(|_| SdkError::JoinTimeout(timeout))?;
        self.task = None;
        joined.map_err(|e| SdkError::Subscription(format!("subscription task failed: {e}")))?
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Resolves once cancellation is requested or the handle is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

struct TopicStream {
    connector: Arc<dyn MirrorConnector>,
    address: String,
    query: TopicQuery,
    settings: ExecuteSettings,
}

impl TopicStream {
    async fn run<F>(mut self, mut handler: F, mut cancel: watch::Receiver<bool>) -> Result<()>
    where
        F: FnMut(TopicMessage) + Send,
    {
        let topic = self.query.topic_id.clone();
        let limit = self.query.limit;
        let mut delivered: u64 = 0;
        let mut failures: u32 = 0;

        loop {
            let opened = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => return self.stopped(delivered),
                opened = self.connector.subscribe(&self.address, &self.query) => opened,
            };

            let error = match opened {
                Ok(mut stream) => loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancelled(&mut cancel) => return self.stopped(delivered),
                        next = stream.next_message() => next,
                    };
                    match next {
                        Some(Ok(message)) => {
                            failures = 0;
                            delivered += 1;
                            self.query.start_time =
                                Some(message.consensus_timestamp + Duration::from_nanos(1));
                            if limit > 0 {
                                self.query.limit = limit - delivered;
                            }
                            handler(message);
                            if limit > 0 && delivered >= limit {
                                info!(topic = %topic, delivered, "Subscription reached its limit");
                                return Ok(());
                            }
                        }
                        Some(Err(error)) => break error,
                        None => {
                            info!(topic = %topic, delivered, "Subscription complete");
                            return Ok(());
                        }
                    }
                },
                Err(error) => error,
            };

            failures += 1;
            metric_inc!(RETRIES, &[OPERATION, "transport"]);
            if failures >= self.settings.max_attempts {
                warn!(topic = %topic, failures, error = %error, "Subscription giving up");
                return Err(SdkError::Subscription(format!(
                    "topic {topic}: {failures} consecutive failures, last: {error}"
                )));
            }

            let delay = self.settings.backoff_for(failures - 1);
            warn!(
                topic = %topic,
                failures,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Subscription stream failed, reconnecting"
            );
            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => return self.stopped(delivered),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn stopped(&self, delivered: u64) -> Result<()> {
        debug!(topic = %self.query.topic_id, delivered, "Subscription cancelled");
        Ok(())
    }
}
