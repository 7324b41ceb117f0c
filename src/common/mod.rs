//! Common types, traits, and error definitions for dynamic_rrt_star
//!
//! This module provides the foundational building blocks shared by the
//! obstacle model, the control loop and the planners.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
