//! The `presence` module maintains the set of active participants per game
//! room: who is online, reconciled from join/leave deltas and full-state
//! snapshots shared over the presence topic.

pub mod record;
pub mod tracker;

pub use record::{PresenceRecord, PresenceStatus};
pub use tracker::{PresenceSubscription, PresenceTracker, TrackState};
