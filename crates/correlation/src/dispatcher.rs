//! Outbound-queue reply dispatcher.
//!
//! The outbound queue is shared by every caller, and `LPOP` removes what it
//! returns. If each caller popped it independently, a caller would discard
//! replies meant for someone else. Instead a single dispatcher drains the
//! queue and routes each reply to the caller registered for its id. Replies
//! with no local caller (the caller gave up, or lives in another gateway
//! process) are republished as a direct key, which every caller also polls.

use gateway_core::keys::{response_key, OUTBOUND_QUEUE};
use gateway_core::{Error, ReplyOutcome, ReplySignal, Result};
use keyed_store::KeyedStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use telemetry::metrics;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::CorrelationConfig;

struct Waiter {
    seq: u64,
    tx: oneshot::Sender<ReplyOutcome>,
}

/// Routes outbound-queue replies to the callers waiting for them.
pub struct ReplyDispatcher {
    store: Arc<dyn KeyedStore>,
    config: CorrelationConfig,
    waiters: Mutex<HashMap<String, Waiter>>,
    next_seq: AtomicU64,
}

impl ReplyDispatcher {
    pub fn new(store: Arc<dyn KeyedStore>, config: CorrelationConfig) -> Self {
        Self {
            store,
            config,
            waiters: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Registers interest in the reply for `id`.
    ///
    /// Must happen before the request is enqueued, otherwise a fast worker
    /// could answer before anyone is listening. Only one caller per id may
    /// wait at a time.
    pub fn register(self: &Arc<Self>, id: &str) -> Result<PendingReply> {
        let (tx, rx) = oneshot::channel();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let pending = {
            let mut waiters = self.waiters.lock();
            if waiters.contains_key(id) {
                return Err(Error::DuplicateRequest(id.to_string()));
            }
            waiters.insert(id.to_string(), Waiter { seq, tx });
            metrics().pending_replies.set(waiters.len() as u64);
            waiters.len()
        };

        debug!(request_id = %id, pending, "Registered reply waiter");
        Ok(PendingReply {
            dispatcher: Arc::clone(self),
            id: id.to_string(),
            seq,
            rx: Some(rx),
        })
    }

    /// Number of callers currently waiting.
    pub fn pending(&self) -> usize {
        self.waiters.lock().len()
    }

    fn deregister(&self, id: &str, seq: u64) {
        let mut waiters = self.waiters.lock();
        // A later caller may have reused the id after ours was delivered.
        if waiters.get(id).is_some_and(|w| w.seq == seq) {
            waiters.remove(id);
        }
        metrics().pending_replies.set(waiters.len() as u64);
    }

    /// Pops the outbound queue until it is empty. Returns the entries handled.
    pub async fn drain_once(&self) -> Result<usize> {
        let mut handled = 0;
        while let Some(raw) = self.store.lpop(OUTBOUND_QUEUE).await? {
            self.dispatch(&raw).await;
            handled += 1;
        }
        Ok(handled)
    }

    async fn dispatch(&self, raw: &str) {
        let Some(signal) = ReplySignal::decode(raw) else {
            metrics().malformed_replies.inc();
            warn!(entry = %raw, "Dropping malformed outbound entry");
            return;
        };
        let Some(id) = signal.id.clone() else {
            metrics().malformed_replies.inc();
            warn!(entry = %raw, "Dropping outbound entry without id");
            return;
        };

        let waiter = self.waiters.lock().remove(&id);
        if let Some(waiter) = waiter {
            match waiter.tx.send(signal.into_outcome()) {
                Ok(()) => {
                    debug!(request_id = %id, "Delivered reply from outbound queue");
                    return;
                }
                // The caller timed out between our lookup and the send.
                Err(_) => debug!(request_id = %id, "Caller left before delivery"),
            }
        }

        self.republish(&id, raw).await;
    }

    /// Makes an unclaimed reply visible on the direct-key channel.
    async fn republish(&self, id: &str, raw: &str) {
        let key = response_key(id);

        match self.store.get(&key).await {
            Ok(Some(_)) => {
                debug!(request_id = %id, "Reply already published on direct key");
                return;
            }
            Ok(None) => {}
            Err(e) => warn!(request_id = %id, "Direct key lookup failed: {}", e),
        }

        metrics().orphan_replies.inc();
        match self
            .store
            .set(&key, raw, Some(self.config.orphan_reply_ttl()))
            .await
        {
            Ok(()) => info!(
                request_id = %id,
                ttl_secs = self.config.orphan_reply_ttl_secs,
                "Republished unclaimed reply to direct key"
            ),
            Err(e) => {
                metrics().store_errors.inc();
                warn!(request_id = %id, "Lost unclaimed reply: {}", e);
            }
        }
    }

    /// Drains the outbound queue forever, pausing one poll interval when empty.
    pub async fn run(self: Arc<Self>) {
        info!(
            queue = OUTBOUND_QUEUE,
            poll_interval_ms = self.config.poll_interval_ms,
            "Reply dispatcher starting"
        );

        loop {
            match self.drain_once().await {
                Ok(_) => tokio::time::sleep(self.config.poll_interval()).await,
                Err(e) => {
                    metrics().store_errors.inc();
                    warn!("Outbound queue drain failed: {}", e);
                    tokio::time::sleep(self.config.error_backoff()).await;
                }
            }
        }
    }
}

/// A registered wait for one request's reply.
///
/// Dropping it deregisters the caller, on every exit path.
pub struct PendingReply {
    dispatcher: Arc<ReplyDispatcher>,
    id: String,
    seq: u64,
    rx: Option<oneshot::Receiver<ReplyOutcome>>,
}

impl PendingReply {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolves when the dispatcher delivers a reply.
    ///
    /// Pends forever once the channel is closed without a reply, so it can
    /// sit in a `select!` next to other channels.
    pub async fn recv(&mut self) -> ReplyOutcome {
        if let Some(rx) = self.rx.as_mut() {
            let result = rx.await;
            self.rx = None;
            if let Ok(outcome) = result {
                return outcome;
            }
        }
        std::future::pending().await
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.dispatcher.deregister(&self.id, self.seq);
    }
}
