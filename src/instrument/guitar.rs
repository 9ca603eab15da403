use anyhow::Result;
use tracing::{debug, trace};

use crate::config::Config;
use crate::pose::Pose;

use super::model::{InstrumentFrame, InstrumentModel};
use super::pitch::PitchMapper;
use super::strum::StrumDetector;

/// 検出されたストローク
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strum {
    pub pitch_offset: i32,
}

/// 1フレーム処理の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    /// 描画用。信頼度不足のフレームでは `None`
    pub frame: Option<InstrumentFrame>,
    pub strum: Option<Strum>,
}

impl FrameOutcome {
    pub fn is_skipped(&self) -> bool {
        self.frame.is_none()
    }
}

/// ストロークの受け手 (音源側)
///
/// 受け取ったら現在の再生を止め、新しいピッチで鳴らし直す。
pub trait StrumSink {
    fn on_strum(&mut self, pitch_offset: i32) -> Result<()>;
}

/// 受け取ったピッチを記録するだけのシンク
impl StrumSink for Vec<i32> {
    fn on_strum(&mut self, pitch_offset: i32) -> Result<()> {
        self.push(pitch_offset);
        Ok(())
    }
}

/// キーポイント → ジオメトリ → ストローク判定 → ピッチ のフレーム処理
///
/// フレームをまたいで残る状態は `StrumDetector` の前回ピック位置のみ。
pub struct AirGuitar {
    model: InstrumentModel,
    detector: StrumDetector,
    pitch: PitchMapper,
}

impl AirGuitar {
    pub fn new(model: InstrumentModel, pitch: PitchMapper) -> Self {
        Self {
            model,
            detector: StrumDetector::new(),
            pitch,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            InstrumentModel::from_config(&config.instrument),
            PitchMapper::from_config(&config.pitch),
        )
    }

    pub fn detector(&self) -> &StrumDetector {
        &self.detector
    }

    /// 1フレーム処理する
    ///
    /// 信頼度不足のフレームは何も更新しない (前回ピック位置も保持)。
    pub fn process(&mut self, pose: &Pose) -> FrameOutcome {
        let frame = match self.model.compute(pose) {
            Some(frame) => frame,
            None => {
                trace!("frame skipped: wrist confidence too low");
                return FrameOutcome {
                    frame: None,
                    strum: None,
                };
            }
        };

        let g = &frame.geometry;
        let strummed = self.detector.update(frame.pick, g.neck_end, g.bridge);
        let strum = if strummed {
            let pitch_offset = self.pitch.map(frame.fret_wrist, g.neck_start, g.neck_end);
            debug!(
                pitch_offset,
                pick_x = frame.pick.x,
                pick_y = frame.pick.y,
                "strum"
            );
            Some(Strum { pitch_offset })
        } else {
            None
        };

        FrameOutcome {
            frame: Some(frame),
            strum,
        }
    }

    /// 1フレーム処理し、ストロークがあればシンクへ渡す
    pub fn process_into<S: StrumSink + ?Sized>(&mut self, pose: &Pose, sink: &mut S) -> Result<FrameOutcome> {
        let outcome = self.process(pose);
        if let Some(strum) = outcome.strum {
            sink.on_strum(strum.pitch_offset)?;
        }
        Ok(outcome)
    }
}

impl Default for AirGuitar {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistanceMode, PitchConfig};
    use crate::geometry::Point;
    use crate::pose::{Keypoint, KeypointIndex};

    /// ネックは y=260 の水平線 (x: 200〜600)、ネック側手首は (500, 260)。
    /// 前腕は常に長さ100の鉛直なので、ピックは手首の 50px 下。
    fn make_pose(strum_wrist_y: f32, wrist_confidence: f32) -> Pose {
        let mut pose = Pose::default();
        pose.set(KeypointIndex::LeftShoulder, Keypoint::new(300.0, 100.0, 0.9));
        pose.set(KeypointIndex::LeftHip, Keypoint::new(280.0, 300.0, 0.9));
        pose.set(KeypointIndex::RightHip, Keypoint::new(320.0, 300.0, 0.9));
        pose.set(KeypointIndex::LeftWrist, Keypoint::new(500.0, 260.0, 0.9));
        pose.set(
            KeypointIndex::RightWrist,
            Keypoint::new(300.0, strum_wrist_y, wrist_confidence),
        );
        pose.set(KeypointIndex::RightElbow, Keypoint::new(300.0, strum_wrist_y - 100.0, 0.9));
        pose
    }

    #[test]
    fn test_downstroke_emits_pitch() {
        let mut guitar = AirGuitar::default();
        let mut sink: Vec<i32> = Vec::new();

        // ピック (300, 350) → (300, 250): ネックを下から上へ横切る
        let first = guitar.process_into(&make_pose(300.0, 0.9), &mut sink).unwrap();
        assert!(first.strum.is_none());
        let second = guitar.process_into(&make_pose(200.0, 0.9), &mut sink).unwrap();

        assert_eq!(second.strum, Some(Strum { pitch_offset: 9 }));
        assert_eq!(sink, vec![9]);
        let frame = second.frame.unwrap();
        assert_eq!(frame.geometry.neck_end, Point::new(600.0, 260.0));
    }

    #[test]
    fn test_reverse_direction_is_silent() {
        let mut guitar = AirGuitar::default();
        let mut sink: Vec<i32> = Vec::new();

        guitar.process_into(&make_pose(200.0, 0.9), &mut sink).unwrap();
        let outcome = guitar.process_into(&make_pose(300.0, 0.9), &mut sink).unwrap();

        assert!(outcome.strum.is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_skipped_frame_keeps_last_pick() {
        let mut guitar = AirGuitar::default();
        let mut sink: Vec<i32> = Vec::new();

        guitar.process_into(&make_pose(300.0, 0.9), &mut sink).unwrap();
        let last = guitar.detector().last_pick();

        let skipped = guitar.process_into(&make_pose(250.0, 0.4), &mut sink).unwrap();
        assert!(skipped.is_skipped());
        assert!(skipped.strum.is_none());
        assert_eq!(guitar.detector().last_pick(), last);

        // 直前の有効フレームとの比較で発火する
        let outcome = guitar.process_into(&make_pose(200.0, 0.9), &mut sink).unwrap();
        assert!(outcome.strum.is_some());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_legacy_pitch_mode() {
        let config = Config {
            pitch: PitchConfig {
                distance: DistanceMode::Legacy,
                ..PitchConfig::default()
            },
            ..Config::default()
        };
        let mut guitar = AirGuitar::from_config(&config);

        guitar.process(&make_pose(300.0, 0.9));
        let outcome = guitar.process(&make_pose(200.0, 0.9));
        assert_eq!(outcome.strum, Some(Strum { pitch_offset: 7 }));
    }

    #[test]
    fn test_repeated_strokes() {
        let mut guitar = AirGuitar::default();
        let mut sink: Vec<i32> = Vec::new();

        for _ in 0..3 {
            guitar.process_into(&make_pose(300.0, 0.9), &mut sink).unwrap();
            guitar.process_into(&make_pose(200.0, 0.9), &mut sink).unwrap();
        }
        assert_eq!(sink, vec![9, 9, 9]);
    }

    struct FailingSink;

    impl StrumSink for FailingSink {
        fn on_strum(&mut self, _pitch_offset: i32) -> Result<()> {
            anyhow::bail!("audio offline")
        }
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut guitar = AirGuitar::default();
        guitar.process_into(&make_pose(300.0, 0.9), &mut FailingSink).unwrap();
        assert!(guitar.process_into(&make_pose(200.0, 0.9), &mut FailingSink).is_err());
        // 失敗しても前回ピック位置は更新済み
        assert!(guitar.detector().last_pick().is_some());
    }
}
