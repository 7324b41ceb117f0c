//! Common traits defining the planner boundary

use crate::common::types::{Hyperparameters, Point2D};
use crate::obstacles::ObstacleSnapshot;

/// Everything the planner sees on one control cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerState {
    pub start: Point2D,
    pub goal: Point2D,
    pub hyperparameters: Hyperparameters,
    /// Obstacle layout in effect at decision time
    pub obstacle_snapshot: ObstacleSnapshot,
}

/// Waypoints returned by a planner, as two index-aligned coordinate lists
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlannerOutput {
    pub path_x: Vec<f64>,
    pub path_y: Vec<f64>,
    pub success: bool,
}

impl PlannerOutput {
    /// Successful output through the given waypoints
    pub fn from_points(points: &[Point2D]) -> Self {
        Self {
            path_x: points.iter().map(|p| p.x).collect(),
            path_y: points.iter().map(|p| p.y).collect(),
            success: true,
        }
    }

    /// Failed output echoing the current start
    pub fn failure(start: Point2D) -> Self {
        Self {
            path_x: vec![start.x],
            path_y: vec![start.y],
            success: false,
        }
    }

    pub fn len(&self) -> usize {
        self.path_x.len().min(self.path_y.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn waypoint(&self, index: usize) -> Option<Point2D> {
        Some(Point2D::new(*self.path_x.get(index)?, *self.path_y.get(index)?))
    }

    pub fn waypoints(&self) -> Vec<Point2D> {
        self.path_x
            .iter()
            .zip(self.path_y.iter())
            .map(|(&x, &y)| Point2D::new(x, y))
            .collect()
    }
}

/// Path planner queried once per tick by the control loop
pub trait Planner {
    /// Plan a path from `state.start` to `state.goal` around `state.obstacle_snapshot`
    fn plan(&mut self, state: &PlannerState) -> PlannerOutput;
}

impl<P: Planner + ?Sized> Planner for Box<P> {
    fn plan(&mut self, state: &PlannerState) -> PlannerOutput {
        (**self).plan(state)
    }
}
