//! The `service` module holds the facade that the site's game UIs talk to.
//! It selects the transport once at construction, owns the channel registry
//! for the life of the process, and exposes the subscribe/track/broadcast
//! surface everything else is built on.

pub mod facade;

pub use facade::{ScoreSubscription, SyncService};

#[cfg(test)]
mod tests;
