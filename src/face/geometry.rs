use nalgebra::{distance, Point2, Rotation2};

/// Clip the value between the lower and upper bounds.
///
/// # Arguments
/// * `value` - The value to be clipped.
/// * `lower` - The lower bound.
/// * `upper` - The upper bound.
///
/// # Returns
/// The clipped value.
pub fn clip<T>(value: T, lower: T, upper: T) -> T
where
    T: PartialOrd,
{
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

/// Euclidean distance between two points in the image plane.
///
/// # Arguments
/// * `point_1` - First point.
/// * `point_2` - Second point.
///
/// # Returns
/// Distance.
pub fn distance_2d(point_1: &Point2<f64>, point_2: &Point2<f64>) -> f64 {
    distance(point_1, point_2)
}

/// Rotate the point about the center.
///
/// # Arguments
/// * `point` - Point to rotate.
/// * `center` - Center of the rotation.
/// * `angle` - Signed rotation angle in radian. The positive value rotates
/// from the +x axis toward the +y axis.
///
/// # Returns
/// Rotated point.
pub fn rotate_point(point: &Point2<f64>, center: &Point2<f64>, angle: f64) -> Point2<f64> {
    center + Rotation2::new(angle) * (point - center)
}

/// Map the value linearly from the input range to the output range.
///
/// # Notes
/// The ratio of the value in the input range is clipped to [0, 1] before the
/// scaling. Therefore the output is always between the output bounds, no
/// matter how far the value is outside of the input range. The output range
/// can be descending.
///
/// # Arguments
/// * `value` - Value to map.
/// * `input_min` - Input value that maps to the `output_min`.
/// * `input_max` - Input value that maps to the `output_max`. This should be
/// different from the `input_min`.
/// * `output_min` - Output value of the `input_min`.
/// * `output_max` - Output value of the `input_max`.
///
/// # Returns
/// Mapped value.
pub fn remap(value: f64, input_min: f64, input_max: f64, output_min: f64, output_max: f64) -> f64 {
    let ratio = clip((value - input_min) / (input_max - input_min), 0.0, 1.0);

    output_min + ratio * (output_max - output_min)
}
