//! The `transport` module abstracts "send/receive events on a named topic"
//! behind a single trait with exactly two implementations: `LiveTransport`,
//! which talks to a hosted real-time backend over WebSocket, and
//! `SimulatedTransport`, a deterministic local stand-in used whenever no
//! live backend is configured.
//!
//! Which implementation runs is decided once, at service construction;
//! there is no promotion from simulated to live mid-session.

pub mod live;
pub mod message;
pub mod simulated;

pub use live::LiveTransport;
pub use message::{ClientFrame, PresenceAction, PresenceUpdate, ServerFrame, TransportEvent};
pub use simulated::SimulatedTransport;

use tokio::sync::mpsc::UnboundedReceiver;

/// Send/receive abstraction over named topics.
///
/// Within a single topic, delivery order to a given subscriber matches
/// publish order on this transport instance; nothing is guaranteed across
/// topics. Failures never propagate to callers: a failed publish or
/// subscribe is logged and becomes a no-op for that single operation.
pub trait Transport: Send + Sync {
    /// Open the transport. Idempotent; must be called before events flow.
    fn connect(&self);

    /// Tear the transport down and drop all per-topic state. Idempotent.
    fn disconnect(&self);

    /// Fire-and-forget publish of `event` onto `topic`.
    fn publish(&self, topic: &str, event: TransportEvent);

    /// Open the single underlying subscription for `topic`.
    ///
    /// The channel registry guarantees at most one of these is open per
    /// topic at a time, no matter how many local subscribers exist.
    fn subscribe(&self, topic: &str) -> UnboundedReceiver<TransportEvent>;

    /// Release the underlying subscription for `topic`.
    fn unsubscribe(&self, topic: &str);
}
