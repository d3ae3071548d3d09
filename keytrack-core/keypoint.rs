#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Detected feature point.
///
/// `size` is the diameter of the keypoint's circular footprint and is only
/// used for overlap geometry. `response` is the corner-response value the
/// keypoint was detected with. `angle` is in radians, `-1.0` when unset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub response: f32,
    pub angle: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            response: 0.0,
            angle: -1.0,
        }
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    /// Whether an orientation has been assigned.
    pub fn has_angle(&self) -> bool {
        self.angle >= 0.0
    }

    /// Intersection-over-union of the two keypoints' circular footprints.
    ///
    /// Returns a value in `[0, 1]`: `0` for disjoint (or touching) circles,
    /// `1` for identical ones. When one circle lies entirely inside the other
    /// the ratio of the two areas is returned.
    pub fn overlap(&self, other: &Keypoint) -> f32 {
        let a = f64::from(self.radius());
        let b = f64::from(other.radius());
        let (r_min, r_max) = if a < b { (a, b) } else { (b, a) };
        if r_max <= 0.0 {
            return 0.0;
        }

        let a_2 = a * a;
        let b_2 = b * b;
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        let c = (dx * dx + dy * dy).sqrt();

        // one circle fully inside the other, no intersection points
        if r_min + c <= r_max {
            let (area_min, area_max) = if a_2 < b_2 { (a_2, b_2) } else { (b_2, a_2) };
            return (area_min / area_max) as f32;
        }

        if c >= a + b {
            return 0.0;
        }

        let c_2 = c * c;
        let cos_alpha = ((b_2 + c_2 - a_2) / (2.0 * b * c)).clamp(-1.0, 1.0);
        let cos_beta = ((a_2 + c_2 - b_2) / (2.0 * a * c)).clamp(-1.0, 1.0);
        let alpha = cos_alpha.acos();
        let beta = cos_beta.acos();

        let segment_a = a_2 * beta;
        let segment_b = b_2 * alpha;
        let triangle_a = a_2 * beta.sin() * cos_beta;
        let triangle_b = b_2 * alpha.sin() * cos_alpha;

        let intersection = segment_a + segment_b - triangle_a - triangle_b;
        let union = (a_2 + b_2) * std::f64::consts::PI - intersection;
        (intersection / union) as f32
    }
}
