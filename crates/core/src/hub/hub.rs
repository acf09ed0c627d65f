//! Progress hub implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::metrics::{HUB_DELIVERY_FAILURES, HUB_EVENTS_PUBLISHED, HUB_QUEUE_TRIMS};

use super::config::HubConfig;
use super::transport::{Transport, TransportError};
use super::types::{ProgressEvent, SubscriptionId};

/// The live delivery target currently bound to a task.
struct Binding {
    id: SubscriptionId,
    transport: Arc<dyn Transport>,
}

/// Per-task state. Everything for one task id is serialized by its mutex.
#[derive(Default)]
struct TaskChannel {
    binding: Option<Binding>,
    queue: VecDeque<ProgressEvent>,
}

/// Routes progress events to the single subscriber of each task, queuing
/// them while nobody is attached.
pub struct ProgressHub {
    config: HubConfig,
    channels: RwLock<HashMap<String, Arc<Mutex<TaskChannel>>>>,
    next_subscription: AtomicU64,
}

impl ProgressHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            channels: RwLock::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Bind `transport` as the delivery target for `task_id`.
    ///
    /// Any previous binding is dropped. Queued events are flushed to the new
    /// transport in publish order before this returns; later events go out
    /// live. If the flush itself fails, the undelivered events stay queued,
    /// the binding is dropped again and the error is returned.
    pub async fn subscribe(
        &self,
        task_id: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<SubscriptionId, TransportError> {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let channel = self.channel(task_id).await;
        let mut channel = channel.lock().await;

        if channel.binding.is_some() {
            debug!("Replacing existing subscriber for task {}", task_id);
        }
        channel.binding = Some(Binding {
            id,
            transport: Arc::clone(&transport),
        });

        let queued = channel.queue.len();
        while let Some(event) = channel.queue.front() {
            if let Err(e) = transport.send_text(event.to_json()).await {
                warn!(
                    "Replay to new subscriber of task {} failed, re-queuing: {}",
                    task_id, e
                );
                HUB_DELIVERY_FAILURES.inc();
                channel.binding = None;
                return Err(e);
            }
            channel.queue.pop_front();
        }

        info!(
            "Subscriber attached to task {} ({} queued events replayed)",
            task_id, queued
        );
        Ok(id)
    }

    /// Remove whatever binding exists for `task_id`. Later events are queued.
    pub async fn unsubscribe(&self, task_id: &str) -> bool {
        let Some(channel) = self.existing(task_id).await else {
            return false;
        };
        let mut channel = channel.lock().await;
        let had = channel.binding.take().is_some();
        if had {
            debug!("Subscriber detached from task {}", task_id);
        }
        had
    }

    /// Remove the binding only if it is still the one created by `id`.
    pub async fn release(&self, task_id: &str, id: SubscriptionId) -> bool {
        let Some(channel) = self.existing(task_id).await else {
            return false;
        };
        let mut channel = channel.lock().await;
        match &channel.binding {
            Some(binding) if binding.id == id => {
                channel.binding = None;
                debug!("Subscriber released task {}", task_id);
                true
            }
            _ => false,
        }
    }

    /// Deliver `event` to the current subscriber, or queue it.
    pub async fn publish(&self, task_id: &str, event: ProgressEvent) {
        self.publish_if(task_id, event, || true).await;
    }

    /// Like [`publish`](Self::publish), but only if `condition` holds when
    /// checked under the task's lock. Returns whether the event was accepted.
    pub async fn publish_if<F>(&self, task_id: &str, event: ProgressEvent, condition: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let channel = self.channel(task_id).await;
        let mut channel = channel.lock().await;

        if !condition() {
            return false;
        }

        let transport = channel
            .binding
            .as_ref()
            .map(|binding| Arc::clone(&binding.transport));
        if let Some(transport) = transport {
            match transport.send_text(event.to_json()).await {
                Ok(()) => {
                    HUB_EVENTS_PUBLISHED.with_label_values(&["live"]).inc();
                    return true;
                }
                Err(e) => {
                    warn!(
                        "Delivery to subscriber of task {} failed, falling back to queue: {}",
                        task_id, e
                    );
                    HUB_DELIVERY_FAILURES.inc();
                    channel.binding = None;
                }
            }
        }

        HUB_EVENTS_PUBLISHED.with_label_values(&["queued"]).inc();
        channel.queue.push_back(event);
        if channel.queue.len() > self.config.queue_capacity {
            let excess = channel.queue.len() - self.config.overflow_retain;
            channel.queue.drain(..excess);
            HUB_QUEUE_TRIMS.inc();
            debug!(
                "Replay queue for task {} overflowed, dropped {} oldest events",
                task_id, excess
            );
        }
        true
    }

    /// Wait until any publish in flight for `task_id` has finished.
    pub async fn barrier(&self, task_id: &str) {
        if let Some(channel) = self.existing(task_id).await {
            drop(channel.lock().await);
        }
    }

    pub async fn is_subscribed(&self, task_id: &str) -> bool {
        match self.existing(task_id).await {
            Some(channel) => channel.lock().await.binding.is_some(),
            None => false,
        }
    }

    /// Number of events waiting for a subscriber.
    pub async fn queued_len(&self, task_id: &str) -> usize {
        match self.existing(task_id).await {
            Some(channel) => channel.lock().await.queue.len(),
            None => 0,
        }
    }

    /// Number of tasks with a live subscriber.
    pub async fn subscriber_count(&self) -> usize {
        let channels: Vec<_> = self.channels.read().await.values().cloned().collect();
        let mut count = 0;
        for channel in channels {
            if channel.lock().await.binding.is_some() {
                count += 1;
            }
        }
        count
    }

    /// Drop all hub state for a task that will not publish again.
    pub async fn discard(&self, task_id: &str) {
        if self.channels.write().await.remove(task_id).is_some() {
            debug!("Discarded hub state for task {}", task_id);
        }
    }

    async fn existing(&self, task_id: &str) -> Option<Arc<Mutex<TaskChannel>>> {
        self.channels.read().await.get(task_id).cloned()
    }

    async fn channel(&self, task_id: &str) -> Arc<Mutex<TaskChannel>> {
        if let Some(channel) = self.existing(task_id).await {
            return channel;
        }
        let mut channels = self.channels.write().await;
        Arc::clone(channels.entry(task_id.to_string()).or_default())
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
