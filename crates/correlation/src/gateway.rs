//! Correlation gateway: submit a chat request and wait for its reply.

use gateway_core::keys::{request_key, response_key, INBOUND_QUEUE};
use gateway_core::{ChatMessage, Error, ReplyChannel, ReplyOutcome, ReplySignal, Result};
use keyed_store::KeyedStore;
use std::sync::Arc;
use telemetry::metrics;
use tokio::time::{timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::CorrelationConfig;
use crate::dispatcher::{PendingReply, ReplyDispatcher};

/// Turns a synchronous caller into a bounded wait on an asynchronous reply.
///
/// Holds no per-request state of its own; everything durable lives in the
/// keyed store and in-flight waits are tracked by the dispatcher.
#[derive(Clone)]
pub struct CorrelationGateway {
    store: Arc<dyn KeyedStore>,
    dispatcher: Arc<ReplyDispatcher>,
    config: CorrelationConfig,
}

impl CorrelationGateway {
    pub fn new(
        store: Arc<dyn KeyedStore>,
        dispatcher: Arc<ReplyDispatcher>,
        config: CorrelationConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<ReplyDispatcher> {
        &self.dispatcher
    }

    /// Records `message`, enqueues it for the worker, and waits for the reply.
    ///
    /// Returns the message with `response` filled in. Fails with
    /// `Validation` before touching the store, `Store` if recording or
    /// enqueueing fails, `WorkerFailed` if the worker answered with an error,
    /// and `Timeout` once the response deadline passes.
    pub async fn submit(&self, mut message: ChatMessage) -> Result<ChatMessage> {
        let started = Instant::now();
        let deadline = started + self.config.response_timeout();

        if let Err(e) = message.check() {
            metrics().chats_rejected.inc();
            return Err(e);
        }
        // Only the worker fills in a reply
        message.response = None;

        let pending = self.dispatcher.register(&message.id)?;

        let record = serde_json::to_string(&message)?;
        let entry = serde_json::to_string(&message.queue_entry())?;
        let enqueued = self.record_and_enqueue(&message.id, &record, &entry);
        let depth = match timeout_at(deadline, enqueued).await {
            Ok(depth) => depth?,
            Err(_) => return Err(self.timed_out(message.id, started)),
        };

        metrics().chats_submitted.inc();
        debug!(request_id = %message.id, queue_depth = depth, "Chat request enqueued");

        let Some((outcome, channel)) = self.await_reply(pending, deadline).await else {
            return Err(self.timed_out(message.id, started));
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        metrics().reply_latency_ms.observe(latency_ms);
        match channel {
            ReplyChannel::OutboundQueue => metrics().replies_via_queue.inc(),
            ReplyChannel::DirectKey => metrics().replies_via_direct_key.inc(),
        }

        let reply = outcome.into_result(&message.id).inspect_err(|e| {
            metrics().worker_failures.inc();
            warn!(request_id = %message.id, %channel, "{}", e);
        })?;

        info!(request_id = %message.id, %channel, latency_ms, "Reply received");
        Ok(message.with_response(reply))
    }

    async fn record_and_enqueue(&self, id: &str, record: &str, entry: &str) -> Result<u64> {
        self.store
            .set(&request_key(id), record, self.config.request_ttl())
            .await?;
        self.store.rpush(INBOUND_QUEUE, entry).await
    }

    fn timed_out(&self, id: String, started: Instant) -> Error {
        let waited_ms = started.elapsed().as_millis() as u64;
        metrics().chat_timeouts.inc();
        warn!(request_id = %id, waited_ms, "No reply before deadline");
        Error::Timeout { id, waited_ms }
    }

    /// Waits on both reply channels until one answers or `deadline` passes.
    ///
    /// Each direct-key read also races the deadline and the dispatcher
    /// channel, so a stalled store call never holds the caller past the
    /// deadline.
    async fn await_reply(
        &self,
        mut pending: PendingReply,
        deadline: Instant,
    ) -> Option<(ReplyOutcome, ReplyChannel)> {
        let key = response_key(pending.id());
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let expired = tokio::time::sleep_until(deadline);
        tokio::pin!(expired);

        loop {
            tokio::select! {
                biased;

                outcome = pending.recv() => {
                    return Some((outcome, ReplyChannel::OutboundQueue));
                }
                _ = &mut expired => return None,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;

                        outcome = pending.recv() => {
                            return Some((outcome, ReplyChannel::OutboundQueue));
                        }
                        _ = &mut expired => return None,
                        polled = self.check_direct_key(&key) => {
                            if let Some(outcome) = polled {
                                self.clear_direct_key(&key, deadline).await;
                                return Some((outcome, ReplyChannel::DirectKey));
                            }
                        }
                    }
                }
            }
        }
    }

    /// Reads the direct reply key. Store errors and malformed values count as
    /// "no reply yet"; the deadline bounds how long that can go on.
    async fn check_direct_key(&self, key: &str) -> Option<ReplyOutcome> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match ReplySignal::decode(&raw) {
                Some(signal) => Some(signal.into_outcome()),
                None => {
                    debug!(key, "Ignoring malformed direct reply");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                metrics().store_errors.inc();
                warn!(key, "Direct reply poll failed: {}", e);
                None
            }
        }
    }

    /// Removes a direct reply once read, so a later request reusing the id
    /// does not pick it up. Best effort, bounded by `deadline`.
    async fn clear_direct_key(&self, key: &str, deadline: Instant) {
        match timeout_at(deadline, self.store.delete(key)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                metrics().store_errors.inc();
                warn!(key, "Failed to clear direct reply: {}", e);
            }
            Err(_) => warn!(key, "Clearing direct reply outlived the deadline"),
        }
    }

    /// Reads a persisted request record. Malformed records read as absent.
    pub async fn fetch(&self, id: &str) -> Result<Option<ChatMessage>> {
        let Some(raw) = self.store.get(&request_key(id)).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(request_id = %id, "Ignoring malformed request record: {}", e);
                Ok(None)
            }
        }
    }
}
