//! Pointer mapping and move throttling
use crate::hand::{FrameDimensions, LandmarkPoint};
use crate::protocol::OutboundCommand;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SENSITIVITY: u8 = 3;
pub const MIN_SENSITIVITY: u8 = 1;
pub const MAX_SENSITIVITY: u8 = 10;

/// A pointer position, either in frame pixels or in percent of the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerCoordinate {
    pub x: f32,
    pub y: f32,
}

/// Pointer in both spaces: `absolute` in frame pixels, `relative` in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub absolute: PointerCoordinate,
    pub relative: PointerCoordinate,
}

/// Convert a frame position to percent of the frame.
///
/// `mirrored` flips the horizontal axis, for selfie-view cameras.
pub fn map(point: LandmarkPoint, dims: FrameDimensions, mirrored: bool) -> PointerCoordinate {
    let x = point.x / dims.width * 100.0;
    let y = point.y / dims.height * 100.0;
    PointerCoordinate {
        x: if mirrored { 100.0 - x } else { x },
        y,
    }
}

/// Emits one move command every `sensitivity` hand updates.
///
/// A sensitivity of 1 forwards every frame, 10 the fewest.
#[derive(Debug, Clone)]
pub struct SensitivityGate {
    sensitivity: u8,
    counter: u8,
}

impl Default for SensitivityGate {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl SensitivityGate {
    pub fn new(sensitivity: u8) -> Self {
        Self {
            sensitivity: sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY),
            counter: 1,
        }
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// Advance by one hand-present frame.
    ///
    /// Frames without a hand must not be fed here; the counter keeps its
    /// value until the hand comes back.
    pub fn tick(&mut self, relative: PointerCoordinate) -> Option<OutboundCommand> {
        self.counter += 1;
        if self.counter <= self.sensitivity {
            return None;
        }
        self.counter = 1;
        Some(OutboundCommand::MoveAbsolute {
            x: relative.x,
            y: relative.y,
            is_percentage: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::FRAME;

    fn approx(a: PointerCoordinate, x: f32, y: f32) -> bool {
        (a.x - x).abs() < 0.001 && (a.y - y).abs() < 0.001
    }

    #[test]
    fn test_map_center() {
        let center = LandmarkPoint::new(320.0, 240.0);
        assert!(approx(map(center, FRAME, false), 50.0, 50.0));
        assert!(approx(map(center, FRAME, true), 50.0, 50.0));
    }

    #[test]
    fn test_map_mirrored() {
        let left = LandmarkPoint::new(160.0, 240.0);
        assert!(approx(map(left, FRAME, false), 25.0, 50.0));
        assert!(approx(map(left, FRAME, true), 75.0, 50.0));

        let corner = LandmarkPoint::new(640.0, 0.0);
        assert!(approx(map(corner, FRAME, true), 0.0, 0.0));
    }

    #[test]
    fn test_gate_every_third_update() {
        let mut gate = SensitivityGate::default();
        let at = PointerCoordinate { x: 10.0, y: 20.0 };
        let emitted: Vec<_> = (0..9).map(|_| gate.tick(at)).collect();
        let hits: Vec<usize> = emitted
            .iter()
            .enumerate()
            .filter_map(|(i, cmd)| cmd.as_ref().map(|_| i))
            .collect();
        assert_eq!(hits, vec![2, 5, 8]);
        assert_eq!(
            emitted[2],
            Some(OutboundCommand::MoveAbsolute {
                x: 10.0,
                y: 20.0,
                is_percentage: true
            })
        );
        assert_eq!(gate.counter(), 1);
    }

    #[test]
    fn test_gate_sensitivity_bounds() {
        let at = PointerCoordinate::default();
        let mut every_frame = SensitivityGate::new(0);
        assert_eq!(every_frame.sensitivity(), 1);
        assert!(every_frame.tick(at).is_some());
        assert!(every_frame.tick(at).is_some());

        let mut slowest = SensitivityGate::new(42);
        assert_eq!(slowest.sensitivity(), 10);
        let count = (0..30).filter(|_| slowest.tick(at).is_some()).count();
        assert_eq!(count, 3);
    }
}
