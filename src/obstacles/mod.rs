//! Obstacle model
//!
//! Static and scheduled moving boxes, and the handler that owns and
//! snapshots them.

pub mod obstacle;
pub mod handler;

pub use obstacle::*;
pub use handler::*;
