//! Scripted stand-in for the reply publisher.

use gateway_core::keys::{response_key, INBOUND_QUEUE, OUTBOUND_QUEUE};
use gateway_core::{QueueEntry, ReplySignal};
use keyed_store::{KeyedStore, MemoryStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::fixtures::echo_of;

/// How the scripted worker answers each request.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyMode {
    /// Push `{id, response}` onto the shared outbound queue.
    OutboundQueue,
    /// Write `{response}` to `response:{id}`.
    DirectKey,
    /// Push `{id, error}` onto the outbound queue.
    Fail(String),
    /// Consume requests and never answer.
    Silent,
}

/// Drains the inbound queue of a [`MemoryStore`] and answers every request
/// with `echo: <userMessage>`, the way the real worker would.
pub struct ScriptedWorker {
    seen: Arc<Mutex<Vec<QueueEntry>>>,
    task: JoinHandle<()>,
}

impl ScriptedWorker {
    pub fn spawn(store: MemoryStore, mode: ReplyMode) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        let task = tokio::spawn(async move {
            loop {
                match store.lpop(INBOUND_QUEUE).await {
                    Ok(Some(raw)) => {
                        let entry: QueueEntry =
                            serde_json::from_str(&raw).expect("worker got a malformed entry");
                        answer(&store, &mode, &entry).await;
                        log.lock().push(entry);
                    }
                    _ => tokio::time::sleep(Duration::from_millis(10)).await,
                }
            }
        });

        Self { seen, task }
    }

    /// Every request consumed so far, in queue order.
    pub fn seen(&self) -> Vec<QueueEntry> {
        self.seen.lock().clone()
    }
}

impl Drop for ScriptedWorker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn answer(store: &MemoryStore, mode: &ReplyMode, entry: &QueueEntry) {
    let reply = echo_of(&entry.user_message);

    let result = match mode {
        ReplyMode::OutboundQueue => {
            let signal = ReplySignal::reply(&entry.id, reply);
            store
                .rpush(OUTBOUND_QUEUE, &serde_json::to_string(&signal).unwrap())
                .await
                .map(|_| ())
        }
        ReplyMode::DirectKey => {
            let body = serde_json::json!({ "response": reply }).to_string();
            store.set(&response_key(&entry.id), &body, None).await
        }
        ReplyMode::Fail(error) => {
            let signal = ReplySignal::failure(&entry.id, error);
            store
                .rpush(OUTBOUND_QUEUE, &serde_json::to_string(&signal).unwrap())
                .await
                .map(|_| ())
        }
        ReplyMode::Silent => Ok(()),
    };

    result.expect("worker failed to publish reply");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_worker_answers_on_outbound_queue() {
        let store = MemoryStore::new();
        let worker = ScriptedWorker::spawn(store.clone(), ReplyMode::OutboundQueue);

        let entry = serde_json::json!({
            "id": "r1",
            "userMessage": "hi",
            "timestamp": "2024-01-01T00:00:00Z"
        });
        store
            .rpush(INBOUND_QUEUE, &entry.to_string())
            .await
            .unwrap();

        for _ in 0..100 {
            if store.queue_len(OUTBOUND_QUEUE) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let raw = store.lpop(OUTBOUND_QUEUE).await.unwrap().unwrap();
        let signal = ReplySignal::decode(&raw).unwrap();
        assert_eq!(signal.id.as_deref(), Some("r1"));
        assert_eq!(signal.response.as_deref(), Some("echo: hi"));
        assert_eq!(worker.seen()[0].user_message, "hi");
    }
}
