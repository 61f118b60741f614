//! Hand landmark storage
//!
//! Landmarks follow the 21-point hand topology produced by common hand-pose
//! detectors. Coordinates are pixels in the source frame, y grows downward.
use serde::{Deserialize, Serialize};

pub type Point = nalgebra::Point2<f32>;

/// Number of landmarks in a complete hand.
pub const HAND_LANDMARKS: usize = 21;

pub const THUMB_MCP: usize = 2;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_TIP: usize = 20;

/// (tip, base) of the four non-thumb fingers: index, middle, ring, pinky
pub const FINGERS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_MCP),
    (MIDDLE_TIP, MIDDLE_MCP),
    (RING_TIP, RING_MCP),
    (PINKY_TIP, PINKY_MCP),
];

/// Size of the frame the detector reports coordinates in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameDimensions {
    pub width: f32,
    pub height: f32,
}

pub const FRAME: FrameDimensions = FrameDimensions {
    width: 640.0,
    height: 480.0,
};

/// A single detector keypoint. Extra fields (`z`, `name`, `score`) are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<LandmarkPoint> for Point {
    fn from(p: LandmarkPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

/// All landmarks of one frame, in detector order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet(Vec<LandmarkPoint>);

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self(points)
    }

    /// Whether every landmark of the hand topology is present
    pub fn is_complete(&self) -> bool {
        self.0.len() >= HAND_LANDMARKS
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.0
    }

    /// Landmark at `index`.
    ///
    /// Panics when the index is missing; callers check [`is_complete`](Self::is_complete) first.
    pub fn at(&self, index: usize) -> LandmarkPoint {
        self.0[index]
    }

    /// The tracked pointer landmark.
    pub fn index_tip(&self) -> LandmarkPoint {
        self.at(INDEX_TIP)
    }
}

impl From<Vec<LandmarkPoint>> for LandmarkSet {
    fn from(points: Vec<LandmarkPoint>) -> Self {
        Self(points)
    }
}

/// Latest landmark frame received from the detector.
#[derive(Debug, Default)]
pub struct LandmarkBuffer {
    latest: Option<LandmarkSet>,
}

impl LandmarkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffered frame wholesale.
    pub fn update(&mut self, points: Option<Vec<LandmarkPoint>>) {
        self.latest = points.map(LandmarkSet::from);
        if let Some(set) = self.latest.as_ref().filter(|s| !s.is_complete()) {
            log::trace!(
                "incomplete landmark frame ({} of {HAND_LANDMARKS} points)",
                set.len()
            );
        }
    }

    /// The raw frame, complete or not
    pub fn latest(&self) -> Option<&LandmarkSet> {
        self.latest.as_ref()
    }

    /// The frame only if it holds a complete hand
    pub fn hand(&self) -> Option<&LandmarkSet> {
        self.latest.as_ref().filter(|s| s.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<LandmarkPoint> {
        (0..n).map(|i| LandmarkPoint::new(i as f32, 2.0 * i as f32)).collect()
    }

    #[test]
    fn test_buffer_completeness() {
        let mut buffer = LandmarkBuffer::new();
        assert!(buffer.latest().is_none());
        assert!(buffer.hand().is_none());

        buffer.update(Some(points(20)));
        assert_eq!(buffer.latest().map(LandmarkSet::len), Some(20));
        assert!(buffer.hand().is_none());

        buffer.update(Some(points(21)));
        let hand = buffer.hand().expect("complete hand");
        assert_eq!(hand.index_tip(), LandmarkPoint::new(8.0, 16.0));

        buffer.update(None);
        assert!(buffer.latest().is_none());
    }

    #[test]
    fn test_detector_keypoints_deserialize() {
        let json = r#"[{"x": 1.5, "y": 2.0, "z": 0.1, "name": "wrist"}]"#;
        let set: LandmarkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.points(), &[LandmarkPoint::new(1.5, 2.0)]);
        assert!(!set.is_complete());
    }
}
