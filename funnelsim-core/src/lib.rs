//! # funnelsim-core
//!
//! Shared record types for the funnel simulator.
//!
//! ### Key Submodules:
//! - `events`: the immutable `Event` record produced by the journey simulator
//! - `sink`: persistence collaborators that de-duplicate by `event_id`
//! - `error`: the crate error type

pub mod error;
pub mod events;
pub mod sink;

pub use error::CoreError;
pub use events::{Event, EventType, Properties, PropertyValue};
pub use sink::{EventSink, InMemorySink, InsertStats, JsonLinesSink};
