//! Control loop module
//!
//! Re-planning loop that drives the agent through the moving obstacle field,
//! and the observer hooks it reports to.

pub mod control_loop;
pub mod observer;

pub use control_loop::*;
pub use observer::*;
