use nalgebra::{point, Point2};
use serde::{Deserialize, Serialize};

use crate::constants::NUM_LANDMARK;
use crate::enums::LandmarkName;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct LandmarkPoint {
    // Normalized image coordinates.
    pub x: f64,
    pub y: f64,
    // Relative depth. Not used by the servo mappings.
    #[serde(default)]
    pub z: f64,
}

impl LandmarkPoint {
    /// Create a new landmark point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Projection on the image plane.
    ///
    /// # Returns
    /// Point (x, y).
    pub fn xy(&self) -> Point2<f64> {
        point![self.x, self.y]
    }

    /// The point has the finite (x, y) coordinates or not.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct LandmarkSnapshot {
    // Landmark points of a single frame in the fixed index order.
    pub points: Vec<LandmarkPoint>,
}

impl LandmarkSnapshot {
    /// Create a new landmark snapshot.
    ///
    /// # Arguments
    /// * `points` - Landmark points of a single frame.
    ///
    /// # Returns
    /// A new landmark snapshot.
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// The snapshot has enough points to be processed or not.
    ///
    /// # Returns
    /// True if there are at least NUM_LANDMARK points.
    pub fn is_ready(&self) -> bool {
        self.points.len() >= NUM_LANDMARK
    }

    /// Get the point by index.
    ///
    /// # Arguments
    /// * `index` - 0-based index.
    ///
    /// # Returns
    /// The point on the image plane. None if the point is absent or its
    /// coordinates are not finite (e.g. occluded).
    pub fn get(&self, index: usize) -> Option<Point2<f64>> {
        self.points
            .get(index)
            .filter(|landmark| landmark.is_finite())
            .map(|landmark| landmark.xy())
    }

    /// Get the point by name.
    ///
    /// # Arguments
    /// * `name` - Landmark name.
    ///
    /// # Returns
    /// Same as get().
    pub fn get_named(&self, name: LandmarkName) -> Option<Point2<f64>> {
        self.get(name.index())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// The snapshot has no point or not.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
