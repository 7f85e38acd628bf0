//! Core infrastructure shared by the dispatcher crate.
//!
//! Currently just the event system used for observability: a
//! [`ResilienceEvent`] trait, listener registration, and panic-isolated
//! dispatch.

pub mod events;

pub use events::{EventListener, EventListeners, ResilienceEvent};
