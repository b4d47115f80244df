//! Client core for the sweep radar display.
//!
//! Inbound telemetry flows from the [`channel`] into the [`sync`] state
//! machine; the [`scheduler`] ticks it once per display refresh and hands
//! snapshots to the [`render`] functions. Operator intents leave through
//! [`dispatch`], and [`reflect`] turns all of it into status text.

pub mod channel;
pub mod dispatch;
pub mod math;
pub mod prelude;
pub mod protocol;
pub mod reflect;
pub mod render;
pub mod scheduler;
pub mod sync;
pub mod telemetry;

pub use prelude::{SweepError, SweepResult};
