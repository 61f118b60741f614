//! Landmark frames from an external hand detector.
//!
//! One JSON document per line. Accepted shapes:
//! - `[{"x": .., "y": ..}, ...]`: the landmarks of one hand
//! - `{"keypoints": [...]}`: one detected hand
//! - `[{"keypoints": [...]}, ...]`: all detected hands; the first is used
//! - `null`: no hand in this frame

use anyhow::{Context, Result};
use gesture_common::hand::LandmarkPoint;
use log::warn;
use serde::Deserialize;
use std::path::Path;
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt, AsyncRead, BufReader, Lines, Stdin},
};

#[derive(Deserialize)]
struct DetectedHand {
    keypoints: Vec<LandmarkPoint>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrameDoc {
    Points(Vec<LandmarkPoint>),
    Hand(DetectedHand),
    Hands(Vec<DetectedHand>),
}

impl FrameDoc {
    fn into_points(self) -> Option<Vec<LandmarkPoint>> {
        match self {
            FrameDoc::Points(points) => Some(points),
            FrameDoc::Hand(hand) => Some(hand.keypoints),
            FrameDoc::Hands(hands) => hands.into_iter().next().map(|h| h.keypoints),
        }
    }
}

/// Parse one feed line; `Ok(None)` is a frame without a hand.
pub fn parse_frame(line: &str) -> Result<Option<Vec<LandmarkPoint>>> {
    let doc: Option<FrameDoc> =
        serde_json::from_str(line).context("not a landmark frame")?;
    Ok(doc.and_then(FrameDoc::into_points))
}

pub struct LandmarkFeed<R> {
    lines: Lines<BufReader<R>>,
    line_no: usize,
}

impl LandmarkFeed<Stdin> {
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl LandmarkFeed<File> {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("failed to open landmark feed {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<R: AsyncRead + Unpin> LandmarkFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            line_no: 0,
        }
    }

    /// Next frame, or `None` at the end of the feed.
    ///
    /// Blank and malformed lines are skipped.
    pub async fn next_frame(&mut self) -> Result<Option<Option<Vec<LandmarkPoint>>>> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .context("failed to read landmark feed")?
        {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_frame(line) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => warn!("skipping feed line {}: {e:#}", self.line_no),
            }
        }
        Ok(None)
    }
}
