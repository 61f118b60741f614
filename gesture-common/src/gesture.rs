//! Static hand gesture classification
//!
//! Gestures are recognised from a single frame by a fixed table of rules.
//! Rules are checked in order and the first match wins, so a hand that
//! satisfies several rules always gets the same label.
use crate::hand::{LandmarkSet, Point, FINGERS, INDEX_TIP, THUMB_MCP, THUMB_TIP};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum vertical travel (px) for a finger to count as pointing up or down
pub const EXTENSION_THRESHOLD: f32 = 30.0;
/// Maximum spread (px) between fingertip heights of a flat open hand
pub const LEVEL_TOLERANCE: f32 = 50.0;
/// Maximum thumb-to-index distance (px) for a closed ring
pub const PINCH_DISTANCE: f32 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    ThumbsUp,
    ThumbsDown,
    Stop,
    Ok,
    #[default]
    None,
}

impl GestureLabel {
    pub fn is_none(&self) -> bool {
        *self == GestureLabel::None
    }

    pub fn text(&self) -> &'static str {
        match self {
            GestureLabel::ThumbsUp => "Thumbs Up",
            GestureLabel::ThumbsDown => "Thumbs Down",
            GestureLabel::Stop => "Stop Sign",
            GestureLabel::Ok => "OK Sign",
            GestureLabel::None => "No Gesture Detected",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GestureLabel::ThumbsUp => "👍",
            GestureLabel::ThumbsDown => "👎",
            GestureLabel::Stop => "✋",
            GestureLabel::Ok => "👌",
            GestureLabel::None => "🤚",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// A predicate over a complete hand and the label it produces
#[derive(Clone, Copy)]
pub struct Rule {
    pub label: GestureLabel,
    pub matches: fn(&LandmarkSet) -> bool,
}

/// Built-in rules in priority order
pub const RULES: [Rule; 4] = [
    Rule {
        label: GestureLabel::ThumbsUp,
        matches: is_thumbs_up,
    },
    Rule {
        label: GestureLabel::ThumbsDown,
        matches: is_thumbs_down,
    },
    Rule {
        label: GestureLabel::Stop,
        matches: is_stop,
    },
    Rule {
        label: GestureLabel::Ok,
        matches: is_ok,
    },
];

/// Classify one frame with the built-in rules.
pub fn classify(hand: Option<&LandmarkSet>) -> GestureLabel {
    classify_with(&RULES, hand)
}

/// Classify one frame with `rules`; the first matching rule wins.
///
/// Absent or incomplete hands are never passed to a rule and yield
/// [`GestureLabel::None`].
pub fn classify_with(rules: &[Rule], hand: Option<&LandmarkSet>) -> GestureLabel {
    let Some(hand) = hand.filter(|h| h.is_complete()) else {
        return GestureLabel::None;
    };
    rules
        .iter()
        .find(|rule| (rule.matches)(hand))
        .map_or(GestureLabel::None, |rule| rule.label)
}

// Image y grows downward: "above" means a smaller y.

fn is_extended(hand: &LandmarkSet, tip: usize, base: usize) -> bool {
    hand.at(tip).y < hand.at(base).y - EXTENSION_THRESHOLD
}

fn is_curled(hand: &LandmarkSet, tip: usize, base: usize) -> bool {
    hand.at(tip).y > hand.at(base).y
}

fn fingers_curled(hand: &LandmarkSet) -> bool {
    FINGERS.iter().all(|&(tip, base)| is_curled(hand, tip, base))
}

pub fn is_thumbs_up(hand: &LandmarkSet) -> bool {
    is_extended(hand, THUMB_TIP, THUMB_MCP) && fingers_curled(hand)
}

pub fn is_thumbs_down(hand: &LandmarkSet) -> bool {
    hand.at(THUMB_TIP).y > hand.at(THUMB_MCP).y + EXTENSION_THRESHOLD && fingers_curled(hand)
}

pub fn is_stop(hand: &LandmarkSet) -> bool {
    if !FINGERS
        .iter()
        .all(|&(tip, base)| is_extended(hand, tip, base))
    {
        return false;
    }
    let (min, max) = FINGERS
        .iter()
        .map(|&(tip, _)| hand.at(tip).y)
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    max - min < LEVEL_TOLERANCE
}

pub fn is_ok(hand: &LandmarkSet) -> bool {
    let thumb: Point = hand.at(THUMB_TIP).into();
    let index: Point = hand.at(INDEX_TIP).into();
    nalgebra::distance(&thumb, &index) < PINCH_DISTANCE
        && FINGERS[1..]
            .iter()
            .all(|&(tip, base)| is_extended(hand, tip, base))
}
