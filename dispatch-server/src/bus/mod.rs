//! 消息总线核心实现
//!
//! In-process event bus with named durable queues and at-least-once
//! delivery. Producers publish JSON payloads; consumers receive [`Delivery`]
//! handles and settle them explicitly:
//!
//! - `ack()` — side effects durably applied (or recognized as a no-op);
//! - `nack()` — transient failure, redeliver with backoff and an attempt
//!   counter, dead-letter after `max_attempts`;
//! - `reject()` — poison message (e.g. undecodable body), straight to the
//!   dead-letter store.
//!
//! A dropped, unsettled delivery is requeued, so a consumer that dies
//! mid-message biases toward "maybe twice" rather than "never".
//!
//! One sequential consumer per queue: [`EventBus::subscribe`] hands out the
//! queue's single receiver. Queues themselves are serviced concurrently,
//! each from its own worker task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::utils::AppError;

/// Delivery attempts before a message is dead-lettered.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Redelivery backoff cap.
const MAX_REDELIVERY_DELAY_SECS: u64 = 30;

struct Envelope {
    body: Vec<u8>,
    attempt: u32,
}

struct Queue {
    tx: mpsc::UnboundedSender<Envelope>,
    /// Taken once by the queue's single consumer.
    rx: Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>,
}

impl Queue {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }
}

/// A message that exhausted its attempts or failed to decode.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub queue: String,
    pub reason: String,
    pub attempt: u32,
    pub body: Vec<u8>,
}

/// Dead-letter store with a failure counter. Entries are kept in memory for
/// operator inspection; the counter feeds the log line every routing emits.
#[derive(Clone, Default)]
pub struct DeadLetterStore {
    entries: Arc<Mutex<Vec<DeadLetter>>>,
    total: Arc<AtomicU64>,
}

impl DeadLetterStore {
    fn push(&self, letter: DeadLetter) {
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::error!(
            queue = %letter.queue,
            reason = %letter.reason,
            attempt = letter.attempt,
            total_dead_letters = total,
            "Message dead-lettered"
        );
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(letter);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total messages dead-lettered since startup.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn drain(&self) -> Vec<DeadLetter> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

/// 消息总线 - 负责消息路由和重投递
#[derive(Clone)]
pub struct EventBus {
    queues: Arc<DashMap<String, Queue>>,
    dead_letters: DeadLetterStore,
    max_attempts: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            queues: Arc::new(DashMap::new()),
            dead_letters: DeadLetterStore::default(),
            max_attempts,
        }
    }

    pub fn dead_letters(&self) -> &DeadLetterStore {
        &self.dead_letters
    }

    /// Publish a JSON payload to a named queue, creating it on first use.
    pub fn publish<T: Serialize>(&self, queue: &str, payload: &T) -> Result<(), AppError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::internal(format!("Serialize payload for {queue}: {e}")))?;
        self.send(queue, Envelope { body, attempt: 1 });
        Ok(())
    }

    /// Take the single consumer side of a queue.
    ///
    /// # Panics
    ///
    /// Panics if the queue is already subscribed — per-queue sequential
    /// processing is a startup wiring invariant, not a runtime condition.
    pub fn subscribe(&self, queue: &str) -> Subscription {
        let rx = {
            let entry = self.queues.entry(queue.to_string()).or_insert_with(Queue::new);
            entry
                .rx
                .lock()
                .expect("queue receiver lock poisoned")
                .take()
        };
        let rx = rx.unwrap_or_else(|| panic!("queue '{queue}' already has a consumer"));
        Subscription {
            queue: queue.to_string(),
            rx,
            bus: self.clone(),
        }
    }

    fn send(&self, queue: &str, envelope: Envelope) {
        let entry = self.queues.entry(queue.to_string()).or_insert_with(Queue::new);
        // Unbounded channel: send only fails when the consumer side is gone,
        // which happens during shutdown. Dead-letter rather than lose it.
        if let Err(e) = entry.tx.send(envelope) {
            self.dead_letters.push(DeadLetter {
                queue: queue.to_string(),
                reason: "queue closed".to_string(),
                attempt: e.0.attempt,
                body: e.0.body,
            });
        }
    }

    /// Redeliver after an exponential backoff, or dead-letter when the
    /// attempt budget is spent.
    fn redeliver(&self, queue: String, body: Vec<u8>, attempt: u32, reason: &str) {
        if attempt >= self.max_attempts {
            self.dead_letters.push(DeadLetter {
                queue,
                reason: format!("max attempts exhausted: {reason}"),
                attempt,
                body,
            });
            return;
        }

        let delay = Duration::from_secs((1u64 << attempt.min(5)).min(MAX_REDELIVERY_DELAY_SECS));
        tracing::warn!(
            queue = %queue,
            attempt,
            delay_secs = delay.as_secs(),
            "Scheduling redelivery: {reason}"
        );

        let bus = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            bus.send(
                &queue,
                Envelope {
                    body,
                    attempt: attempt + 1,
                },
            );
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// The consumer side of one queue.
pub struct Subscription {
    queue: String,
    rx: mpsc::UnboundedReceiver<Envelope>,
    bus: EventBus,
}

impl Subscription {
    /// Wait for the next delivery. `None` when the bus is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        let envelope = self.rx.recv().await?;
        Some(Delivery {
            queue: self.queue.clone(),
            body: envelope.body,
            attempt: envelope.attempt,
            bus: self.bus.clone(),
            settled: false,
        })
    }
}

/// One in-flight message. Must be settled via [`ack`](Delivery::ack),
/// [`nack`](Delivery::nack) or [`reject`](Delivery::reject); dropping an
/// unsettled delivery requeues it.
pub struct Delivery {
    queue: String,
    body: Vec<u8>,
    attempt: u32,
    bus: EventBus,
    settled: bool,
}

impl Delivery {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the JSON body into the queue's payload type. Decode failure is
    /// a poison message — callers should `reject()` it.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Side effects durably applied (or recognized as a deliberate no-op).
    pub fn ack(mut self) {
        self.settled = true;
    }

    /// Transient processing failure: redeliver with backoff.
    pub fn nack(mut self, reason: &str) {
        self.settled = true;
        let body = std::mem::take(&mut self.body);
        self.bus.redeliver(self.queue.clone(), body, self.attempt, reason);
    }

    /// Poison message: no redelivery, straight to the dead-letter store.
    pub fn reject(mut self, reason: &str) {
        self.settled = true;
        self.bus.dead_letters.push(DeadLetter {
            queue: self.queue.clone(),
            reason: reason.to_string(),
            attempt: self.attempt,
            body: std::mem::take(&mut self.body),
        });
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if !self.settled {
            let body = std::mem::take(&mut self.body);
            self.bus
                .redeliver(self.queue.clone(), body, self.attempt, "delivery dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    #[tokio::test]
    async fn publish_then_consume_and_ack() {
        let bus = EventBus::new();
        bus.publish("q", &Ping { n: 1 }).unwrap();

        let mut sub = bus.subscribe("q");
        let delivery = sub.recv().await.unwrap();
        assert_eq!(delivery.attempt(), 1);
        assert_eq!(delivery.decode::<Ping>().unwrap(), Ping { n: 1 });
        delivery.ack();
        assert!(bus.dead_letters().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn nack_redelivers_with_incremented_attempt() {
        let bus = EventBus::new();
        bus.publish("q", &Ping { n: 7 }).unwrap();

        let mut sub = bus.subscribe("q");
        let delivery = sub.recv().await.unwrap();
        delivery.nack("simulated failure");

        // Paused clock: advance past the backoff.
        tokio::time::advance(Duration::from_secs(60)).await;
        let second = sub.recv().await.unwrap();
        assert_eq!(second.attempt(), 2);
        assert_eq!(second.decode::<Ping>().unwrap(), Ping { n: 7 });
        second.ack();
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_attempts_dead_letter() {
        let bus = EventBus::with_max_attempts(2);
        bus.publish("q", &Ping { n: 3 }).unwrap();
        let mut sub = bus.subscribe("q");

        let first = sub.recv().await.unwrap();
        first.nack("fail 1");
        tokio::time::advance(Duration::from_secs(60)).await;

        let second = sub.recv().await.unwrap();
        assert_eq!(second.attempt(), 2);
        second.nack("fail 2");
        tokio::time::advance(Duration::from_secs(60)).await;

        assert_eq!(bus.dead_letters().len(), 1);
        assert_eq!(bus.dead_letters().total(), 1);
        let letters = bus.dead_letters().drain();
        assert_eq!(letters[0].queue, "q");
    }

    #[tokio::test]
    async fn reject_dead_letters_without_redelivery() {
        let bus = EventBus::new();
        bus.publish("q", &Ping { n: 9 }).unwrap();
        let mut sub = bus.subscribe("q");
        let delivery = sub.recv().await.unwrap();
        delivery.reject("undecodable");
        assert_eq!(bus.dead_letters().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_delivery_is_requeued() {
        let bus = EventBus::new();
        bus.publish("q", &Ping { n: 4 }).unwrap();
        let mut sub = bus.subscribe("q");
        {
            let _delivery = sub.recv().await.unwrap();
            // dropped without settling
        }
        tokio::time::advance(Duration::from_secs(60)).await;
        let redelivered = sub.recv().await.unwrap();
        assert_eq!(redelivered.attempt(), 2);
        redelivered.ack();
    }

    #[test]
    #[should_panic(expected = "already has a consumer")]
    fn double_subscribe_panics() {
        let bus = EventBus::new();
        let _a = bus.subscribe("q");
        let _b = bus.subscribe("q");
    }
}
