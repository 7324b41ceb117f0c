//! Common types used throughout dynamic_rrt_star

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(arr: [f64; 2]) -> Self {
        Self { x: arr[0], y: arr[1] }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Axis-aligned rectangle `[x_min, y_min, x_max, y_max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Self, ConfigError> {
        let finite = [x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite());
        if !finite || x_min > x_max || y_min > y_max {
            return Err(ConfigError::InvalidBounds { x_min, y_min, x_max, y_max });
        }
        Ok(Self { x_min, y_min, x_max, y_max })
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Lower-left corner
    pub fn min_corner(&self) -> Point2D {
        Point2D::new(self.x_min, self.y_min)
    }

    /// Rigid translation: both corners move by `offset`, the size is kept.
    pub fn translated(&self, offset: &Vector2<f64>) -> Self {
        Self {
            x_min: self.x_min + offset.x,
            y_min: self.y_min + offset.y,
            x_max: self.x_max + offset.x,
            y_max: self.y_max + offset.y,
        }
    }

    /// Point inside the box grown by `clearance` on every side.
    pub fn contains(&self, p: &Point2D, clearance: f64) -> bool {
        p.x >= self.x_min - clearance
            && p.x <= self.x_max + clearance
            && p.y >= self.y_min - clearance
            && p.y <= self.y_max + clearance
    }

    /// Whether segment `a -> b` touches the box grown by `clearance`.
    ///
    /// Slab clipping of the segment parameter against each axis interval.
    pub fn intersects_segment(&self, a: &Point2D, b: &Point2D, clearance: f64) -> bool {
        let d = b.to_vector() - a.to_vector();
        let mut t_enter = 0.0_f64;
        let mut t_exit = 1.0_f64;
        let slabs = [
            (a.x, d.x, self.x_min - clearance, self.x_max + clearance),
            (a.y, d.y, self.y_min - clearance, self.y_max + clearance),
        ];
        for (origin, delta, lo, hi) in slabs {
            if delta.abs() < f64::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let mut t0 = (lo - origin) / delta;
            let mut t1 = (hi - origin) / delta;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = ConfigError;

    fn try_from(arr: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        b.to_array()
    }
}

/// Named planner options handed to every `Planner::plan` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Planner's internal discretization step
    pub step_size: f64,
    /// Planner's own sampling budget
    pub max_iterations: usize,
    /// Planner's goal-proximity tolerance
    pub end_dist_threshold: f64,
    /// Minimum standoff distance from any obstacle
    pub obstacle_clearance: f64,
    /// Corridor width for path generation
    pub lane_width: f64,
}

impl Hyperparameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("step_size", self.step_size),
            ("end_dist_threshold", self.end_dist_threshold),
            ("lane_width", self.lane_width),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidHyperparameter { name, value });
            }
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidHyperparameter {
                name: "max_iterations",
                value: 0.0,
            });
        }
        if !(self.obstacle_clearance.is_finite() && self.obstacle_clearance >= 0.0) {
            return Err(ConfigError::InvalidHyperparameter {
                name: "obstacle_clearance",
                value: self.obstacle_clearance,
            });
        }
        Ok(())
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            step_size: 1.0,
            max_iterations: 16000,
            end_dist_threshold: 1.0,
            obstacle_clearance: 1.0,
            lane_width: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_bounding_box_rejects_inverted_corners() {
        assert!(BoundingBox::new(5.0, 0.0, 1.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, 1.0, f64::NAN).is_err());
        assert!(BoundingBox::new(1.0, 1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_translation_keeps_size() {
        let b = BoundingBox::new(158.0, 58.0, 162.0, 62.0).unwrap();
        let moved = b.translated(&Vector2::new(-0.5, 2.0));
        assert_eq!(moved.to_array(), [157.5, 60.0, 161.5, 64.0]);
        assert!((moved.width() - b.width()).abs() < 1e-12);
        assert!((moved.height() - b.height()).abs() < 1e-12);
    }

    #[test]
    fn test_segment_intersection() {
        let b = BoundingBox::new(165.0, 60.0, 170.0, 65.0).unwrap();
        let a = Point2D::new(160.0, 62.0);
        let c = Point2D::new(175.0, 62.0);
        assert!(b.intersects_segment(&a, &c, 0.0));

        // passes just below the box
        let a = Point2D::new(160.0, 59.5);
        let c = Point2D::new(175.0, 59.5);
        assert!(!b.intersects_segment(&a, &c, 0.0));
        assert!(b.intersects_segment(&a, &c, 1.0));

        // stops short of the box
        let c = Point2D::new(164.0, 62.0);
        assert!(!b.intersects_segment(&Point2D::new(160.0, 62.0), &c, 0.5));
    }

    #[test]
    fn test_bounding_box_json() {
        let b: BoundingBox = serde_json::from_str("[1.0, 2.0, 3.0, 4.0]").unwrap();
        assert_eq!(b.min_corner(), Point2D::new(1.0, 2.0));
        assert!(serde_json::from_str::<BoundingBox>("[3.0, 2.0, 1.0, 4.0]").is_err());
    }

    #[test]
    fn test_hyperparameters_validation() {
        assert!(Hyperparameters::default().validate().is_ok());

        let hp = Hyperparameters { lane_width: 0.0, ..Default::default() };
        assert_eq!(
            hp.validate(),
            Err(ConfigError::InvalidHyperparameter { name: "lane_width", value: 0.0 })
        );

        let hp = Hyperparameters { obstacle_clearance: -0.1, ..Default::default() };
        assert!(hp.validate().is_err());

        let hp = Hyperparameters { obstacle_clearance: 0.0, ..Default::default() };
        assert!(hp.validate().is_ok());

        let hp = Hyperparameters { max_iterations: 0, ..Default::default() };
        assert!(hp.validate().is_err());
    }
}
