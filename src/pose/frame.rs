//! Decoding of pose-estimator output into [`Pose`].
//!
//! One frame is a PoseNet `estimateSinglePose` result serialized as JSON:
//!
//! ```json
//! {"score": 0.8, "keypoints": [{"part": "leftWrist", "position": {"x": 412.0, "y": 96.5}, "score": 0.93}]}
//! ```
//!
//! Labels are validated here so the instrument never sees positional guesses.
//! `part` may be omitted, in which case the entry's array position is its
//! index. Parts that are not listed keep confidence 0.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::BufRead;

use super::keypoint::{Keypoint, KeypointIndex, Pose};

#[derive(Debug, Deserialize)]
struct RawPose {
    keypoints: Vec<RawKeypoint>,
}

#[derive(Debug, Deserialize)]
struct RawKeypoint {
    #[serde(default)]
    part: Option<String>,
    position: RawPosition,
    score: f32,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    x: f32,
    y: f32,
}

/// JSON 1フレーム分を Pose に変換
pub fn parse_pose(json: &str) -> Result<Pose> {
    let raw: RawPose = serde_json::from_str(json).context("Invalid pose JSON")?;
    let mut pose = Pose::default();

    for (i, kp) in raw.keypoints.iter().enumerate() {
        let index = match &kp.part {
            Some(name) => match KeypointIndex::from_part_name(name) {
                Some(idx) => idx,
                None => bail!("keypoint {}: unknown part '{}'", i, name),
            },
            None => match KeypointIndex::from_index(i) {
                Some(idx) => idx,
                None => bail!("keypoint {}: no part label and index out of range", i),
            },
        };

        if !kp.position.x.is_finite() || !kp.position.y.is_finite() || !kp.score.is_finite() {
            bail!("keypoint {} ({}): non-finite value", i, index.part_name());
        }

        pose.set(index, Keypoint::new(kp.position.x, kp.position.y, kp.score));
    }

    Ok(pose)
}

/// 1行1フレームの JSON Lines を読むイテレータ
///
/// 空行は読み飛ばす。各要素は行番号付きのエラーを返しうる。
pub struct PoseReader<R> {
    reader: R,
    line_number: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> PoseReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buf: Vec::new(),
        }
    }

    /// 直前に読んだ行番号 (1始まり)
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for PoseReader<R> {
    type Item = Result<Pose>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line_number = self.line_number;
                    // 不正な UTF-8 は読み込み済みなので、その行だけのパースエラーにする
                    let line = match std::str::from_utf8(&self.buf).context("Invalid UTF-8") {
                        Ok(line) => line.trim(),
                        Err(e) => return Some(Err(e.context(format!("line {}", line_number)))),
                    };
                    if line.is_empty() {
                        continue;
                    }
                    return Some(
                        parse_pose(line).with_context(|| format!("line {}", line_number)),
                    );
                }
                Err(e) => return Some(Err(anyhow::Error::new(e).context("Failed to read pose stream"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_named_parts() {
        let json = r#"{"score": 0.8, "keypoints": [
            {"part": "leftWrist", "position": {"x": 412.0, "y": 96.5}, "score": 0.93},
            {"part": "right_elbow", "position": {"x": 250.0, "y": 150.0}, "score": 0.6}
        ]}"#;
        let pose = parse_pose(json).unwrap();

        let wrist = pose.get(KeypointIndex::LeftWrist);
        assert_eq!(wrist.x, 412.0);
        assert_eq!(wrist.y, 96.5);
        assert_eq!(wrist.confidence, 0.93);
        assert_eq!(pose.get(KeypointIndex::RightElbow).x, 250.0);
        // 未指定のパーツは信頼度0
        assert_eq!(pose.get(KeypointIndex::Nose).confidence, 0.0);
    }

    #[test]
    fn test_parse_positional_parts() {
        let json = r#"{"keypoints": [
            {"position": {"x": 1.0, "y": 2.0}, "score": 0.5},
            {"position": {"x": 3.0, "y": 4.0}, "score": 0.6}
        ]}"#;
        let pose = parse_pose(json).unwrap();
        assert_eq!(pose.get(KeypointIndex::Nose).x, 1.0);
        assert_eq!(pose.get(KeypointIndex::LeftEye).y, 4.0);
    }

    #[test]
    fn test_reject_unknown_part() {
        let json = r#"{"keypoints": [{"part": "tail", "position": {"x": 1.0, "y": 2.0}, "score": 0.5}]}"#;
        let err = parse_pose(json).unwrap_err();
        assert!(err.to_string().contains("tail"));
    }

    #[test]
    fn test_reject_too_many_positional_parts() {
        let entry = r#"{"position": {"x": 1.0, "y": 2.0}, "score": 0.5}"#;
        let entries = vec![entry; KeypointIndex::COUNT + 1].join(",");
        let json = format!(r#"{{"keypoints": [{}]}}"#, entries);
        assert!(parse_pose(&json).is_err());
    }

    #[test]
    fn test_reject_malformed_json() {
        assert!(parse_pose("{not json").is_err());
        assert!(parse_pose(r#"{"score": 0.5}"#).is_err());
    }

    #[test]
    fn test_reader_skips_blank_lines() {
        let input = concat!(
            r#"{"keypoints": [{"part": "nose", "position": {"x": 1.0, "y": 1.0}, "score": 0.9}]}"#,
            "\n\n   \n",
            r#"{"keypoints": [{"part": "nose", "position": {"x": 2.0, "y": 2.0}, "score": 0.9}]}"#,
            "\n",
        );
        let poses: Vec<Pose> = PoseReader::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[1].get(KeypointIndex::Nose).x, 2.0);
    }

    #[test]
    fn test_reader_skips_invalid_utf8_line() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(
            br#"{"keypoints": [{"part": "nose", "position": {"x": 5.0, "y": 6.0}, "score": 0.9}]}"#,
        );
        input.push(b'\n');
        let mut reader = PoseReader::new(Cursor::new(input));

        let err = reader.next().unwrap().unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_none());
        assert!(format!("{:#}", err).contains("line 1"));
        assert_eq!(reader.line_number(), 1);

        // 次の行は読み続けられる
        let pose = reader.next().unwrap().unwrap();
        assert_eq!(pose.get(KeypointIndex::Nose).x, 5.0);
        assert_eq!(reader.line_number(), 2);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_line_numbers_after_invalid_utf8() {
        let input = b"\xff\n{broken\n".to_vec();
        let mut reader = PoseReader::new(Cursor::new(input));
        assert!(reader.next().unwrap().is_err());
        let err = reader.next().unwrap().unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_reader_reports_line_number() {
        let input = "\n{broken\n";
        let mut reader = PoseReader::new(Cursor::new(input));
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(reader.line_number(), 2);
        assert!(format!("{:#}", err).contains("line 2"));
        assert!(reader.next().is_none());
    }
}
