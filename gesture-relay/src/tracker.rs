//! Per-frame processing: landmarks in, gesture, pointer and move commands out.

use crate::{feed::LandmarkFeed, publisher::StatePublisher, relay::CommandSink};
use anyhow::Result;
use gesture_common::{
    gesture::{classify, GestureLabel},
    hand::{FrameDimensions, LandmarkBuffer, LandmarkPoint, FRAME},
    pointer::{map, Pointer, PointerCoordinate, SensitivityGate},
};
use log::info;
use tokio::io::AsyncRead;

pub struct TrackerOptions {
    pub sensitivity: u8,
    pub mirrored: bool,
    pub frame: FrameDimensions,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            sensitivity: gesture_common::pointer::DEFAULT_SENSITIVITY,
            mirrored: false,
            frame: FRAME,
        }
    }
}

/// Turns detector frames into published state and throttled move commands.
///
/// Frames are processed one at a time; each call completes before the next
/// frame is accepted.
pub struct GestureTracker<S> {
    buffer: LandmarkBuffer,
    gate: SensitivityGate,
    frame: FrameDimensions,
    mirrored: bool,
    publisher: StatePublisher,
    sink: S,
}

impl<S: CommandSink> GestureTracker<S> {
    pub fn new(options: TrackerOptions, publisher: StatePublisher, sink: S) -> Self {
        Self {
            buffer: LandmarkBuffer::new(),
            gate: SensitivityGate::new(options.sensitivity),
            frame: options.frame,
            mirrored: options.mirrored,
            publisher,
            sink,
        }
    }

    pub fn publisher(&self) -> &StatePublisher {
        &self.publisher
    }

    pub fn gate(&self) -> &SensitivityGate {
        &self.gate
    }

    /// Process one detector frame; `None` means no hand was found.
    pub fn update_landmarks(&mut self, points: Option<Vec<LandmarkPoint>>) {
        self.buffer.update(points);
        self.publisher.publish_landmarks(self.buffer.latest().cloned());

        let Some(hand) = self.buffer.hand() else {
            self.publisher.publish_pointer(None);
            self.set_gesture(GestureLabel::None);
            return;
        };

        let gesture = classify(Some(hand));
        let tip = hand.index_tip();
        let relative = map(tip, self.frame, self.mirrored);
        self.publisher.publish_pointer(Some(Pointer {
            absolute: PointerCoordinate { x: tip.x, y: tip.y },
            relative,
        }));
        self.set_gesture(gesture);

        if let Some(cmd) = self.gate.tick(relative) {
            // a dropped move is superseded by the next one
            self.sink.send_command(&cmd);
        }
    }

    /// Process every frame of `feed` until it ends.
    pub async fn track<R: AsyncRead + Unpin>(
        &mut self,
        feed: &mut LandmarkFeed<R>,
    ) -> Result<()> {
        while let Some(points) = feed.next_frame().await? {
            self.update_landmarks(points);
        }
        Ok(())
    }

    fn set_gesture(&self, gesture: GestureLabel) {
        if let Some(previous) = self.publisher.publish_gesture(gesture) {
            info!("gesture: {previous} -> {gesture} {}", gesture.emoji());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_common::{
        hand::{FINGERS, HAND_LANDMARKS, INDEX_TIP, THUMB_MCP, THUMB_TIP},
        protocol::OutboundCommand,
    };
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<OutboundCommand>>);

    impl CommandSink for RecordingSink {
        fn send_command(&self, cmd: &OutboundCommand) -> bool {
            self.0.lock().unwrap().push(cmd.clone());
            true
        }
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<OutboundCommand> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Thumb 40px above its base, other fingers curled; index tip at (160, 240)
    fn thumbs_up() -> Vec<LandmarkPoint> {
        let mut points = vec![LandmarkPoint::new(300.0, 300.0); HAND_LANDMARKS];
        points[THUMB_MCP].y = 300.0;
        points[THUMB_TIP].y = 260.0;
        for &(tip, base) in &FINGERS {
            points[base].y = 200.0;
            points[tip].y = 230.0;
        }
        points[INDEX_TIP] = LandmarkPoint::new(160.0, 240.0);
        points
    }

    type Tracker = GestureTracker<Arc<RecordingSink>>;

    fn setup(sensitivity: u8, mirrored: bool) -> (Tracker, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let options = TrackerOptions {
            sensitivity,
            mirrored,
            ..Default::default()
        };
        let tracker = GestureTracker::new(options, StatePublisher::new(), Arc::clone(&sink));
        (tracker, sink)
    }

    #[test]
    fn test_thumbs_up_end_to_end() {
        let (mut tracker, sink) = setup(3, false);
        for _ in 0..3 {
            tracker.update_landmarks(Some(thumbs_up()));
        }

        let publisher = tracker.publisher();
        assert_eq!(publisher.gesture(), GestureLabel::ThumbsUp);
        assert_eq!(publisher.landmarks().map(|l| l.len()), Some(HAND_LANDMARKS));
        let pointer = publisher.pointer().unwrap();
        assert_eq!(pointer.absolute, PointerCoordinate { x: 160.0, y: 240.0 });
        assert!((pointer.relative.x - 25.0).abs() < 0.001);
        assert!((pointer.relative.y - 50.0).abs() < 0.001);

        assert_eq!(
            sink.sent(),
            vec![OutboundCommand::MoveAbsolute {
                x: 25.0,
                y: 50.0,
                is_percentage: true
            }]
        );
    }

    #[test]
    fn test_mirrored_pointer() {
        let (mut tracker, sink) = setup(1, true);
        tracker.update_landmarks(Some(thumbs_up()));
        let relative = tracker.publisher().pointer().unwrap().relative;
        assert!((relative.x - 75.0).abs() < 0.001);
        match sink.sent().as_slice() {
            [OutboundCommand::MoveAbsolute { x, .. }] => assert!((x - 75.0).abs() < 0.001),
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn test_no_hand_keeps_gate_counter() {
        let (mut tracker, sink) = setup(3, false);
        tracker.update_landmarks(Some(thumbs_up()));
        tracker.update_landmarks(Some(thumbs_up()));
        assert_eq!(tracker.gate().counter(), 3);

        for _ in 0..5 {
            tracker.update_landmarks(None);
        }
        assert!(sink.sent().is_empty());
        assert_eq!(tracker.gate().counter(), 3);
        let publisher = tracker.publisher();
        assert_eq!(publisher.gesture(), GestureLabel::None);
        assert!(publisher.pointer().is_none());
        assert!(publisher.landmarks().is_none());

        tracker.update_landmarks(Some(thumbs_up()));
        assert_eq!(sink.sent().len(), 1);
        assert_eq!(tracker.gate().counter(), 1);
    }

    #[test]
    fn test_incomplete_frame_is_no_hand() {
        let (mut tracker, sink) = setup(1, false);
        let mut partial = thumbs_up();
        partial.truncate(12);
        tracker.update_landmarks(Some(partial));

        let publisher = tracker.publisher();
        assert_eq!(publisher.landmarks().map(|l| l.len()), Some(12));
        assert!(publisher.pointer().is_none());
        assert_eq!(publisher.gesture(), GestureLabel::None);
        assert!(sink.sent().is_empty());
        assert_eq!(tracker.gate().counter(), 1);
    }

    #[tokio::test]
    async fn test_track_feed() {
        let (mut tracker, sink) = setup(3, false);
        let frame = serde_json::to_string(&thumbs_up()).unwrap();
        let input = format!("{frame}\n{frame}\nnull\n{frame}\nnull\n");
        let mut feed = LandmarkFeed::new(input.as_bytes());

        tracker.track(&mut feed).await.unwrap();
        assert_eq!(sink.sent().len(), 1);
        assert_eq!(tracker.publisher().gesture(), GestureLabel::None);
        assert!(tracker.publisher().pointer().is_none());
    }

    #[test]
    fn test_gesture_change_does_not_reset_gate() {
        let (mut tracker, sink) = setup(3, false);
        let mut neutral = thumbs_up();
        neutral[THUMB_TIP].y = 300.0;

        tracker.update_landmarks(Some(thumbs_up()));
        tracker.update_landmarks(Some(neutral));
        assert_eq!(tracker.publisher().gesture(), GestureLabel::None);
        tracker.update_landmarks(Some(thumbs_up()));
        assert_eq!(tracker.publisher().gesture(), GestureLabel::ThumbsUp);
        assert_eq!(sink.sent().len(), 1);
    }
}
