//! The `events` module defines the structured application events that flow
//! through the sync layer and the broadcaster that fans them out.
//!
//! Events are transient: nothing here is persisted, deduplicated, or
//! replayed. A subscriber attached after an event fired never sees it.

pub mod broadcaster;
pub mod message;

pub use broadcaster::{EventBroadcaster, GameEventSubscription};
pub use message::{GameEvent, GameEventKind, ScoreEvent};

#[cfg(test)]
mod tests;
