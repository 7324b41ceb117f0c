//! Rectangular obstacles with piecewise-constant motion schedules
//!
//! A dynamic obstacle follows an ordered list of `(velocity, duration)`
//! segments. Every tick the box translates rigidly by the active velocity and
//! the time spent in that segment grows by the tick length. Once the segment
//! has run for its full duration the cursor moves on; segments are never
//! replayed, and an obstacle whose schedule is used up stays where it is.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::{BoundingBox, ConfigError};

/// What happens to the time overshooting a completed segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Drop the overshoot; the next segment starts from zero.
    #[default]
    Discard,
    /// Credit the overshoot to the following segments.
    CarryOver,
}

/// One piece of a movement schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSegment {
    /// Displacement applied on every tick of this segment
    pub velocity: Vector2<f64>,
    /// Time the segment stays active
    pub duration: f64,
}

impl MotionSegment {
    pub fn new(velocity: Vector2<f64>, duration: f64) -> Self {
        Self { velocity, duration }
    }
}

/// Ordered segments plus a cursor to the active one
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionSchedule {
    segments: Vec<MotionSegment>,
    cursor: usize,
    elapsed: f64,
}

impl MotionSchedule {
    pub fn new(segments: Vec<MotionSegment>) -> Result<Self, ConfigError> {
        for (index, seg) in segments.iter().enumerate() {
            if !(seg.duration.is_finite() && seg.duration > 0.0) {
                return Err(ConfigError::NonPositiveDuration { index, duration: seg.duration });
            }
            if !seg.velocity.iter().all(|v| v.is_finite()) {
                return Err(ConfigError::NonFiniteVelocity { index });
            }
        }
        Ok(Self { segments, cursor: 0, elapsed: 0.0 })
    }

    /// Build from parallel movement and duration lists
    pub fn from_lists(movements: &[[f64; 2]], durations: &[f64]) -> Result<Self, ConfigError> {
        if movements.len() != durations.len() {
            return Err(ConfigError::ScheduleLengthMismatch {
                movements: movements.len(),
                durations: durations.len(),
            });
        }
        let segments = movements
            .iter()
            .zip(durations)
            .map(|(m, &d)| MotionSegment::new(Vector2::new(m[0], m[1]), d))
            .collect();
        Self::new(segments)
    }

    pub fn active(&self) -> Option<&MotionSegment> {
        self.segments.get(self.cursor)
    }

    /// Segments not yet completed, the active one first
    pub fn remaining(&self) -> &[MotionSegment] {
        &self.segments[self.cursor.min(self.segments.len())..]
    }

    /// Segments already run to completion
    pub fn completed(&self) -> &[MotionSegment] {
        &self.segments[..self.cursor.min(self.segments.len())]
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.segments.len()
    }

    /// Time accumulated within the active segment
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Consume `dt` of the schedule and return the velocity that was active
    /// for this tick, or `None` if the schedule is already used up.
    fn step(&mut self, dt: f64, policy: RemainderPolicy) -> Option<Vector2<f64>> {
        let active = *self.active()?;
        self.elapsed += dt;
        if self.elapsed >= active.duration {
            self.cursor += 1;
            match policy {
                RemainderPolicy::Discard => self.elapsed = 0.0,
                RemainderPolicy::CarryOver => {
                    self.elapsed -= active.duration;
                    while let Some(next) = self.active() {
                        if self.elapsed < next.duration {
                            break;
                        }
                        self.elapsed -= next.duration;
                        self.cursor += 1;
                    }
                    if self.is_exhausted() {
                        self.elapsed = 0.0;
                    }
                }
            }
        }
        Some(active.velocity)
    }
}

/// A single axis-aligned obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    bounds: BoundingBox,
    initial: BoundingBox,
    is_dynamic: bool,
    schedule: MotionSchedule,
}

impl Obstacle {
    /// Obstacle that never moves
    pub fn fixed(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            initial: bounds,
            is_dynamic: false,
            schedule: MotionSchedule::default(),
        }
    }

    /// Moving obstacle; `movements[i]` is applied each tick for `durations[i]` time
    pub fn dynamic(
        bounds: BoundingBox,
        movements: &[[f64; 2]],
        durations: &[f64],
    ) -> Result<Self, ConfigError> {
        let schedule = MotionSchedule::from_lists(movements, durations)?;
        Ok(Self::with_schedule(bounds, schedule))
    }

    pub fn with_schedule(bounds: BoundingBox, schedule: MotionSchedule) -> Self {
        Self {
            bounds,
            initial: bounds,
            is_dynamic: true,
            schedule,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    pub fn schedule(&self) -> &MotionSchedule {
        &self.schedule
    }

    /// Whether the next advance will move this obstacle
    pub fn is_moving(&self) -> bool {
        self.is_dynamic && !self.schedule.is_exhausted()
    }

    /// Offset of the lower-left corner from where the obstacle started
    pub fn displacement(&self) -> Vector2<f64> {
        self.bounds.min_corner().to_vector() - self.initial.min_corner().to_vector()
    }

    /// Advance by one tick of length `dt`, dropping any segment overshoot
    pub fn advance(&mut self, dt: f64) -> Result<BoundingBox, ConfigError> {
        self.advance_with_policy(dt, RemainderPolicy::Discard)
    }

    pub fn advance_with_policy(
        &mut self,
        dt: f64,
        policy: RemainderPolicy,
    ) -> Result<BoundingBox, ConfigError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::NonPositiveStep(dt));
        }
        Ok(self.advance_unchecked(dt, policy))
    }

    /// `dt` must already be known to be positive and finite
    pub(crate) fn advance_unchecked(&mut self, dt: f64, policy: RemainderPolicy) -> BoundingBox {
        if !self.is_dynamic {
            return self.bounds;
        }
        if let Some(velocity) = self.schedule.step(dt, policy) {
            self.bounds = self.bounds.translated(&velocity);
        }
        self.bounds
    }
}
