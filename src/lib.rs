//! dynamic_rrt_star - re-planning among moving obstacles
//!
//! This crate simulates a 2D workspace of static and scheduled moving boxes
//! and drives a sense, plan, act loop that re-plans with RRT* (or any other
//! [`Planner`]) on every tick until the agent reaches its goal.

// Core modules
pub mod common;
pub mod obstacles;

// Algorithm modules
pub mod control;
pub mod path_planning;

// Configuration
pub mod scenario;

// Re-export common types for convenience
pub use common::{BoundingBox, Hyperparameters, Point2D};
pub use common::{Planner, PlannerOutput, PlannerState};
pub use common::{ConfigError, SimError, SimResult};
pub use control::{AbortHandle, ControlLoop, LoopConfig, LoopState, LoopSummary, TickObserver, TickReport};
pub use obstacles::{Obstacle, ObstacleHandler, ObstacleSnapshot, RemainderPolicy};
pub use path_planning::RRTStar;
pub use scenario::Scenario;
