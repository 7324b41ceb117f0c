//! JSON scenario files
//!
//! A scenario bundles everything one run needs: start and goal, the obstacle
//! tick length, every obstacle with its schedule, the planner hyperparameters
//! and the loop budget.
//!
//! ```json
//! {
//!   "start": [140, 60],
//!   "goal": [180, 60],
//!   "step_size": 1.0,
//!   "obstacles": [
//!     { "bounds": [158, 58, 162, 62], "dynamic": true,
//!       "movements": [[-0.5, 0], [0.5, 0]], "steps": [10, 10] },
//!     { "bounds": [165, 60, 170, 65] }
//!   ],
//!   "hyperparameters": { "step_size": 1.0, "max_iterations": 16000,
//!     "end_dist_threshold": 1.0, "obstacle_clearance": 1.0, "lane_width": 10.0 },
//!   "sim_loop": 100,
//!   "end_dist_threshold": 1.0
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{BoundingBox, Hyperparameters, Point2D, SimResult};
use crate::control::{ControlLoop, LoopConfig};
use crate::obstacles::{Obstacle, ObstacleHandler, RemainderPolicy};

/// One obstacle entry of a scenario file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpec {
    /// `[x_min, y_min, x_max, y_max]`
    pub bounds: [f64; 4],
    #[serde(default)]
    pub dynamic: bool,
    /// Per-tick displacement of each segment
    #[serde(default)]
    pub movements: Vec<[f64; 2]>,
    /// Duration of each segment
    #[serde(default)]
    pub steps: Vec<f64>,
}

impl ObstacleSpec {
    pub fn build(&self) -> SimResult<Obstacle> {
        let bounds = BoundingBox::try_from(self.bounds)?;
        if self.dynamic {
            Ok(Obstacle::dynamic(bounds, &self.movements, &self.steps)?)
        } else {
            Ok(Obstacle::fixed(bounds))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub start: [f64; 2],
    pub goal: [f64; 2],
    /// Obstacle tick length
    #[serde(default = "default_step_size")]
    pub step_size: f64,
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,
    pub obstacles: Vec<ObstacleSpec>,
    #[serde(default)]
    pub hyperparameters: Hyperparameters,
    #[serde(flatten)]
    pub loop_config: LoopConfig,
}

fn default_step_size() -> f64 {
    1.0
}

impl Scenario {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn build_handler(&self) -> SimResult<ObstacleHandler> {
        let mut handler = ObstacleHandler::new(self.step_size)?.with_remainder_policy(self.remainder_policy);
        for spec in &self.obstacles {
            handler.add(spec.build()?);
        }
        Ok(handler)
    }

    pub fn build_loop(&self) -> SimResult<ControlLoop> {
        ControlLoop::new(
            self.build_handler()?,
            Point2D::from(self.start),
            Point2D::from(self.goal),
            self.hyperparameters.clone(),
            self.loop_config.clone(),
        )
    }
}

impl Default for Scenario {
    /// Two moving boxes crossing the straight line between start and goal,
    /// and one static box next to it.
    fn default() -> Self {
        Scenario {
            start: [140.0, 60.0],
            goal: [180.0, 60.0],
            step_size: 1.0,
            remainder_policy: RemainderPolicy::Discard,
            obstacles: vec![
                ObstacleSpec {
                    bounds: [158.0, 58.0, 162.0, 62.0],
                    dynamic: true,
                    movements: vec![[-0.5, 0.0], [0.5, 0.0], [0.0, -1.0]],
                    steps: vec![10.0, 10.0, 5.0],
                },
                ObstacleSpec {
                    bounds: [170.0, 55.0, 175.0, 60.0],
                    dynamic: true,
                    movements: vec![[0.0, 1.0], [0.0, -1.0], [0.0, 1.0], [0.0, -1.0]],
                    steps: vec![10.0, 5.0, 10.0, 20.0],
                },
                ObstacleSpec {
                    bounds: [165.0, 60.0, 170.0, 65.0],
                    dynamic: false,
                    movements: Vec::new(),
                    steps: Vec::new(),
                },
            ],
            hyperparameters: Hyperparameters::default(),
            loop_config: LoopConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ConfigError, SimError};

    #[test]
    fn test_default_scenario_builds() {
        let scenario = Scenario::default();
        let control = scenario.build_loop().unwrap();
        let snapshot = control.handler().collect();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.is_dynamic(2), Some(false));
        assert_eq!(control.start(), Point2D::new(140.0, 60.0));
    }

    #[test]
    fn test_json_round_trip() {
        let scenario = Scenario::default();
        let json = scenario.to_json_string().unwrap();
        assert!(json.contains("\"sim_loop\": 100"));
        assert_eq!(Scenario::from_json_str(&json).unwrap(), scenario);
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "start": [0, 0],
            "goal": [10, 0],
            "obstacles": [{ "bounds": [4, -1, 5, 1] }],
            "sim_loop": 20,
            "end_dist_threshold": 0.5
        }"#;
        let scenario = Scenario::from_json_str(json).unwrap();
        assert_eq!(scenario.step_size, 1.0);
        assert_eq!(scenario.remainder_policy, RemainderPolicy::Discard);
        assert_eq!(scenario.hyperparameters, Hyperparameters::default());
        assert_eq!(scenario.loop_config, LoopConfig { sim_loop: 20, end_dist_threshold: 0.5 });
        assert!(!scenario.obstacles[0].dynamic);
    }

    #[test]
    fn test_mismatched_schedule_is_rejected() {
        let json = r#"{
            "start": [0, 0],
            "goal": [10, 0],
            "obstacles": [{ "bounds": [4, -1, 5, 1], "dynamic": true,
                            "movements": [[1, 0], [0, 1]], "steps": [3] }],
            "sim_loop": 20,
            "end_dist_threshold": 0.5,
            "remainder_policy": "carry_over"
        }"#;
        let scenario = Scenario::from_json_str(json).unwrap();
        assert_eq!(scenario.remainder_policy, RemainderPolicy::CarryOver);
        let err = scenario.build_handler().unwrap_err();
        assert!(matches!(
            err,
            SimError::Configuration(ConfigError::ScheduleLengthMismatch { movements: 2, durations: 1 })
        ));
    }

    #[test]
    fn test_invalid_bounds_are_rejected() {
        let json = r#"{
            "start": [0, 0], "goal": [10, 0],
            "obstacles": [{ "bounds": [5, 1, 4, -1] }],
            "sim_loop": 20, "end_dist_threshold": 0.5
        }"#;
        let scenario = Scenario::from_json_str(json).unwrap();
        assert!(matches!(
            scenario.build_loop(),
            Err(SimError::Configuration(ConfigError::InvalidBounds { .. }))
        ));
    }

    #[test]
    fn test_malformed_json_is_scenario_error() {
        assert!(matches!(Scenario::from_json_str("{ \"start\": "), Err(SimError::Scenario(_))));
    }

    #[test]
    fn test_default_scenario_runs_with_rrt_star() {
        let mut scenario = Scenario::default();
        scenario.hyperparameters.max_iterations = 2000;
        let mut control = scenario.build_loop().unwrap();
        let mut planner = crate::path_planning::RRTStar::with_seed(42);

        let summary = control.run(&mut planner, &mut crate::control::NoopObserver).unwrap();

        assert!(summary.ticks <= 100);
        assert_eq!(summary.outcome, crate::control::LoopState::GoalReached);
        assert!(summary.distance_to_goal() <= 1.0);
        assert_eq!(control.handler().ticks(), summary.ticks);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Scenario::from_path("/nonexistent/scenario.json").unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
