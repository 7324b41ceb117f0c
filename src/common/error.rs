//! Error types for dynamic_rrt_star

use thiserror::Error;

/// Invalid input detected while building obstacles, handlers or a control loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid bounding box [{x_min}, {y_min}, {x_max}, {y_max}]")]
    InvalidBounds {
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    },

    #[error("schedule has {movements} movements but {durations} durations")]
    ScheduleLengthMismatch { movements: usize, durations: usize },

    #[error("segment {index} has non-positive duration {duration}")]
    NonPositiveDuration { index: usize, duration: f64 },

    #[error("segment {index} has a non-finite velocity")]
    NonFiniteVelocity { index: usize },

    #[error("time step must be positive, got {0}")]
    NonPositiveStep(f64),

    #[error("hyperparameter `{name}` is invalid: {value}")]
    InvalidHyperparameter { name: &'static str, value: f64 },

    #[error("iteration budget `sim_loop` must be at least 1")]
    ZeroIterationBudget,

    #[error("end distance threshold must be positive, got {0}")]
    NonPositiveThreshold(f64),
}

/// Main error type for the simulation
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed obstacle schedule, step size or hyperparameters
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The planner reported success with an unusable path
    #[error("planner contract violated at tick {tick}: {reason}")]
    PlannerContractViolation { tick: usize, reason: String },

    /// Scenario file could not be understood
    #[error("scenario error: {0}")]
    Scenario(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for simulation operations
pub type SimResult<T> = Result<T, SimError>;
