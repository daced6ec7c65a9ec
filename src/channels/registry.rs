use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::transport::{Transport, TransportEvent};

/// Multiplexes many local subscribers onto one transport subscription per
/// topic.
///
/// A channel is created lazily on the first subscribe for its topic, which
/// opens exactly one underlying transport subscription. It is torn down
/// when the last local subscriber cancels, releasing the transport resource
/// within the same call. The topic map is the shared critical section: all
/// mutation goes through subscribe/cancel under the inner mutex.
pub struct ChannelRegistry {
    transport: Arc<dyn Transport>,
    inner: Arc<Mutex<HashMap<String, Channel>>>,
    next_id: AtomicU64,
}

/// The registry's per-topic object: the set of local subscriber channels
/// fed by the single transport subscription.
struct Channel {
    subscribers: HashMap<u64, UnboundedSender<TransportEvent>>,
}

impl ChannelRegistry {
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            inner: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        })
    }

    /// Register a local subscriber for `topic`, creating the channel (and
    /// its single transport subscription) if none exists yet.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut channels = self.inner.lock().unwrap();
        let channel = channels.entry(topic.to_string()).or_insert_with(|| {
            let incoming = self.transport.subscribe(topic);
            Self::spawn_fanout(Arc::clone(&self.inner), topic.to_string(), incoming);
            debug!(topic, "channel opened");
            Channel {
                subscribers: HashMap::new(),
            }
        });
        channel.subscribers.insert(id, tx);

        Subscription {
            handle: Arc::new(SubscriptionHandle {
                inner: Arc::clone(&self.inner),
                transport: Arc::clone(&self.transport),
                topic: topic.to_string(),
                id,
                cancelled: AtomicBool::new(false),
            }),
            receiver: rx,
        }
    }

    fn spawn_fanout(
        inner: Arc<Mutex<HashMap<String, Channel>>>,
        topic: String,
        mut incoming: UnboundedReceiver<TransportEvent>,
    ) {
        tokio::spawn(async move {
            while let Some(event) = incoming.recv().await {
                let channels = inner.lock().unwrap();
                if let Some(channel) = channels.get(&topic) {
                    for sender in channel.subscribers.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                // a missing entry means the channel was torn down; keep
                // draining until the transport side closes
            }
            debug!(%topic, "fan-out ended");
        });
    }

    /// Number of topics with an open channel.
    pub fn topic_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Number of local subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .get(topic)
            .map(|c| c.subscribers.len())
            .unwrap_or(0)
    }

    /// Tear down every channel, releasing each transport subscription.
    /// Used by the service facade's shutdown.
    pub fn clear(&self) {
        let mut channels = self.inner.lock().unwrap();
        for topic in channels.keys() {
            self.transport.unsubscribe(topic);
        }
        channels.clear();
    }
}

/// The cancellation side of a subscription, shared between the owning
/// `Subscription` and any component that needs to cancel it remotely.
pub struct SubscriptionHandle {
    inner: Arc<Mutex<HashMap<String, Channel>>>,
    transport: Arc<dyn Transport>,
    topic: String,
    id: u64,
    cancelled: AtomicBool,
}

impl SubscriptionHandle {
    /// Remove this subscriber from its channel; the last one out tears the
    /// channel down and releases the transport subscription in the same
    /// call. Single-use and idempotent: later calls are no-ops.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut channels = self.inner.lock().unwrap();
        if let Some(channel) = channels.get_mut(&self.topic) {
            channel.subscribers.remove(&self.id);
            if channel.subscribers.is_empty() {
                channels.remove(&self.topic);
                self.transport.unsubscribe(&self.topic);
                debug!(topic = %self.topic, "channel released");
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A live (topic, subscriber) registration and the receiving end of its
/// event channel. Cancelling (or dropping) removes the subscriber; the
/// last one out releases the topic's transport subscription.
pub struct Subscription {
    handle: Arc<SubscriptionHandle>,
    receiver: UnboundedReceiver<TransportEvent>,
}

impl Subscription {
    /// Next event on this topic, in delivery order. `None` once cancelled.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn topic(&self) -> &str {
        &self.handle.topic
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// A cancellation handle that can outlive (or be shared apart from)
    /// this subscription.
    pub fn handle(&self) -> Arc<SubscriptionHandle> {
        Arc::clone(&self.handle)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
