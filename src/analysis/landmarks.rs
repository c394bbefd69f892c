// Landmarks - hand landmark model and planar geometry helpers
//
// Landmarks arrive from the detector as normalized camera-space points
// in [0, 1]. All thresholds in the classifier are expressed in the same
// 2D projection, so distances here ignore z.

use serde::{Deserialize, Serialize};

/// Number of landmarks reported per detected hand
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Fingertips used for closure checks, thumb excluded
pub const FINGERTIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// A single tracked point in normalized camera space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HandLandmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl HandLandmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// The 21 landmarks of one detected hand
///
/// Serialized as a plain array so recorded fixtures stay compact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HandLandmark>", into = "Vec<HandLandmark>")]
pub struct HandLandmarks {
    points: [HandLandmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [HandLandmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a detector slice
    ///
    /// # Returns
    /// * `Some(HandLandmarks)` - slice had exactly 21 points
    /// * `None` - any other length
    pub fn from_slice(points: &[HandLandmark]) -> Option<Self> {
        let points: [HandLandmark; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn get(&self, index: usize) -> HandLandmark {
        self.points[index]
    }

    pub fn wrist(&self) -> HandLandmark {
        self.points[WRIST]
    }

    pub fn points(&self) -> &[HandLandmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(HandLandmark::is_finite)
    }

    /// Distance between two landmark indices on this hand
    pub fn distance(&self, a: usize, b: usize) -> f32 {
        planar_distance(self.points[a], self.points[b])
    }

    /// Fingertip-to-wrist distances in index, middle, ring, pinky order
    pub fn fingertip_distances(&self) -> [f32; 4] {
        FINGERTIPS.map(|tip| self.distance(tip, WRIST))
    }
}

impl TryFrom<Vec<HandLandmark>> for HandLandmarks {
    type Error = String;

    fn try_from(points: Vec<HandLandmark>) -> Result<Self, Self::Error> {
        let len = points.len();
        Self::from_slice(&points)
            .ok_or_else(|| format!("expected {} landmarks, got {}", LANDMARK_COUNT, len))
    }
}

impl From<HandLandmarks> for Vec<HandLandmark> {
    fn from(hand: HandLandmarks) -> Self {
        hand.points.to_vec()
    }
}

/// Euclidean distance over (x, y)
#[inline]
pub fn planar_distance(a: HandLandmark, b: HandLandmark) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Planar angle at `vertex` between the rays towards `a` and `b`, in radians
///
/// Returns 0.0 when either ray is degenerate.
pub fn angle_at(a: HandLandmark, vertex: HandLandmark, b: HandLandmark) -> f32 {
    let (ax, ay) = (a.x - vertex.x, a.y - vertex.y);
    let (bx, by) = (b.x - vertex.x, b.y - vertex.y);
    let len_a = (ax * ax + ay * ay).sqrt();
    let len_b = (bx * bx + by * by).sqrt();
    if len_a <= f32::EPSILON || len_b <= f32::EPSILON {
        return 0.0;
    }
    let cos = ((ax * bx + ay * by) / (len_a * len_b)).clamp(-1.0, 1.0);
    cos.acos()
}
