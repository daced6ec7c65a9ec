use std::sync::Arc;

use crate::channels::{ChannelRegistry, Subscription, topic};
use crate::events::message::GameEvent;
use crate::transport::{Transport, TransportEvent};

/// Publishes structured game events onto `game:<gameId>` topics and hands
/// out subscriptions to them.
///
/// Fire-and-forget: no acknowledgement is awaited, nothing is deduplicated
/// or retried, and an event published before a subscriber attached is
/// permanently lost.
pub struct EventBroadcaster {
    registry: Arc<ChannelRegistry>,
    transport: Arc<dyn Transport>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<ChannelRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Publish `event` to its game's topic through the active transport.
    pub fn broadcast(&self, event: GameEvent) {
        let game_topic = topic::game(&event.game_id);
        self.transport
            .publish(&game_topic, TransportEvent::Game(event));
    }

    /// Subscribe to the raw `GameEvent` stream for `game_id`, in delivery
    /// order.
    pub fn subscribe(&self, game_id: &str) -> GameEventSubscription {
        GameEventSubscription {
            inner: self.registry.subscribe(&topic::game(game_id)),
        }
    }
}

/// A cancellable stream of `GameEvent`s for one game room.
pub struct GameEventSubscription {
    inner: Subscription,
}

impl GameEventSubscription {
    /// The next game event; payloads of other kinds on the topic are
    /// skipped. `None` once cancelled.
    pub async fn recv(&mut self) -> Option<GameEvent> {
        while let Some(event) = self.inner.recv().await {
            if let TransportEvent::Game(game_event) = event {
                return Some(game_event);
            }
        }
        None
    }

    /// Non-blocking variant of `recv`.
    pub fn try_recv(&mut self) -> Option<GameEvent> {
        while let Some(event) = self.inner.try_recv() {
            if let TransportEvent::Game(game_event) = event {
                return Some(game_event);
            }
        }
        None
    }

    /// Idempotent; dropping the subscription cancels too.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}
