//! Ordered obstacle collection advanced in lock step

use crate::common::{BoundingBox, ConfigError};
use crate::obstacles::obstacle::{Obstacle, RemainderPolicy};

/// Owned copy of every obstacle box and its dynamic flag, in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObstacleSnapshot {
    boxes: Vec<BoundingBox>,
    dynamic: Vec<bool>,
}

impl ObstacleSnapshot {
    pub fn new(boxes: Vec<BoundingBox>, dynamic: Vec<bool>) -> Self {
        debug_assert_eq!(boxes.len(), dynamic.len());
        Self { boxes, dynamic }
    }

    /// Snapshot of static boxes only
    pub fn from_boxes(boxes: Vec<BoundingBox>) -> Self {
        let dynamic = vec![false; boxes.len()];
        Self { boxes, dynamic }
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn is_dynamic(&self, index: usize) -> Option<bool> {
        self.dynamic.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// `(bounds, is_dynamic)` pairs by index
    pub fn iter(&self) -> impl Iterator<Item = (&BoundingBox, bool)> + '_ {
        self.boxes.iter().zip(self.dynamic.iter().copied())
    }
}

/// Obstacle handler
///
/// Owns all obstacles of one simulation. Each call to [`advance_all`] moves
/// every obstacle by one tick of `step_size`; [`collect`] copies the layout
/// out so later ticks never change a snapshot already handed to a planner.
///
/// [`advance_all`]: ObstacleHandler::advance_all
/// [`collect`]: ObstacleHandler::collect
#[derive(Debug, Clone)]
pub struct ObstacleHandler {
    step_size: f64,
    remainder: RemainderPolicy,
    obstacles: Vec<Obstacle>,
    ticks: usize,
}

impl ObstacleHandler {
    pub fn new(step_size: f64) -> Result<Self, ConfigError> {
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(ConfigError::NonPositiveStep(step_size));
        }
        Ok(Self {
            step_size,
            remainder: RemainderPolicy::default(),
            obstacles: Vec::new(),
            ticks: 0,
        })
    }

    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder = policy;
        self
    }

    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Move every obstacle forward by one tick, in insertion order
    pub fn advance_all(&mut self) {
        for obstacle in &mut self.obstacles {
            obstacle.advance_unchecked(self.step_size, self.remainder);
        }
        self.ticks += 1;
    }

    /// Independent copy of the current layout
    pub fn collect(&self) -> ObstacleSnapshot {
        ObstacleSnapshot {
            boxes: self.obstacles.iter().map(Obstacle::bounds).collect(),
            dynamic: self.obstacles.iter().map(Obstacle::is_dynamic).collect(),
        }
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn remainder_policy(&self) -> RemainderPolicy {
        self.remainder
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Number of `advance_all` calls so far
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}
