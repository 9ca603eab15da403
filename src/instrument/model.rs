use crate::config::{Handedness, InstrumentConfig};
use crate::geometry::Point;
use crate::pose::{KeypointIndex, Pose};

/// 楽器の役割ごとのキーポイント割り当て
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRoles {
    /// ネックを押さえる手の手首
    pub fret_wrist: KeypointIndex,
    /// ストロークする手の手首
    pub strum_wrist: KeypointIndex,
    /// ストロークする手の肘
    pub strum_elbow: KeypointIndex,
    pub shoulder: KeypointIndex,
    /// 胴体高さの基準に使う腰
    pub primary_hip: KeypointIndex,
    pub secondary_hip: KeypointIndex,
}

impl PartRoles {
    pub fn for_handedness(handedness: Handedness) -> Self {
        let right_handed = Self {
            fret_wrist: KeypointIndex::LeftWrist,
            strum_wrist: KeypointIndex::RightWrist,
            strum_elbow: KeypointIndex::RightElbow,
            shoulder: KeypointIndex::LeftShoulder,
            primary_hip: KeypointIndex::LeftHip,
            secondary_hip: KeypointIndex::RightHip,
        };
        match handedness {
            Handedness::Right => right_handed,
            Handedness::Left => right_handed.mirrored(),
        }
    }

    fn mirrored(&self) -> Self {
        Self {
            fret_wrist: self.fret_wrist.mirrored(),
            strum_wrist: self.strum_wrist.mirrored(),
            strum_elbow: self.strum_elbow.mirrored(),
            shoulder: self.shoulder.mirrored(),
            primary_hip: self.primary_hip.mirrored(),
            secondary_hip: self.secondary_hip.mirrored(),
        }
    }
}

/// 1フレーム分の楽器ジオメトリ。毎フレーム作り直す
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentGeometry {
    pub shoulder: Point,
    pub hip_left: Point,
    pub hip_right: Point,
    /// 基準の腰の y − 肩の y
    pub torso_height: f32,
    /// 両腰の中点を胴体高さの `hip_lift` 割だけ上げた点
    pub hip_center: Point,
    /// 腰中心からネック側手首への角度 (ラジアン)
    pub neck_angle: f32,
    pub neck_start: Point,
    pub neck_end: Point,
    pub bridge: Point,
}

/// InstrumentModel の出力
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentFrame {
    pub geometry: InstrumentGeometry,
    pub pick: Point,
    pub fret_wrist: Point,
}

/// キーポイントから仮想ギターのネックとピック位置を求める
///
/// 状態を持たない。両手首の信頼度が閾値を超えないフレームは `None`。
#[derive(Debug, Clone)]
pub struct InstrumentModel {
    roles: PartRoles,
    confidence_threshold: f32,
    hip_lift: f32,
    neck_start: f32,
    neck_end: f32,
    bridge: f32,
    pick_extension: f32,
}

impl InstrumentModel {
    pub fn new() -> Self {
        Self::from_config(&InstrumentConfig::default())
    }

    /// 設定から作成
    pub fn from_config(config: &InstrumentConfig) -> Self {
        Self {
            roles: PartRoles::for_handedness(config.handedness),
            confidence_threshold: config.confidence_threshold,
            hip_lift: config.hip_lift,
            neck_start: config.neck_start,
            neck_end: config.neck_end,
            bridge: config.bridge,
            pick_extension: config.pick_extension,
        }
    }

    /// Pose から楽器ジオメトリとピック位置を計算
    ///
    /// 信頼度を見るのは両手首のみ。肩・腰・肘は検出値をそのまま使う。
    /// 胴体高さが 0 に近いとネックが1点に潰れるが、その場合は
    /// 交差判定が常に偽になるだけなので特別扱いしない。
    pub fn compute(&self, pose: &Pose) -> Option<InstrumentFrame> {
        let fret = pose.get(self.roles.fret_wrist);
        let strum = pose.get(self.roles.strum_wrist);

        if !fret.is_confident(self.confidence_threshold)
            || !strum.is_confident(self.confidence_threshold)
        {
            return None;
        }

        let fret_wrist = fret.position();
        let strum_wrist = strum.position();
        let strum_elbow = pose.get(self.roles.strum_elbow).position();
        let shoulder = pose.get(self.roles.shoulder).position();
        let primary_hip = pose.get(self.roles.primary_hip).position();
        let secondary_hip = pose.get(self.roles.secondary_hip).position();

        // ピック = 手首から前腕方向へ (前腕長 × 係数) 倍だけ延長
        let forearm_x = strum_wrist.x - strum_elbow.x;
        let forearm_y = strum_wrist.y - strum_elbow.y;
        let pick_ratio = forearm_x.hypot(forearm_y) * self.pick_extension;
        let pick = Point::new(
            strum_wrist.x + forearm_x * pick_ratio,
            strum_wrist.y + forearm_y * pick_ratio,
        );

        let torso_height = primary_hip.y - shoulder.y;
        let hips = primary_hip.midpoint(&secondary_hip);
        let hip_center = Point::new(hips.x, hips.y - torso_height * self.hip_lift);

        let neck_angle = hip_center.angle_to(&fret_wrist);
        let neck_start = hip_center.offset_along(neck_angle, torso_height * self.neck_start);
        let neck_end = hip_center.offset_along(neck_angle, torso_height * self.neck_end);
        let bridge = hip_center.offset_along(neck_angle, torso_height * self.bridge);

        let (hip_left, hip_right) = if self.roles.primary_hip == KeypointIndex::LeftHip {
            (primary_hip, secondary_hip)
        } else {
            (secondary_hip, primary_hip)
        };

        Some(InstrumentFrame {
            geometry: InstrumentGeometry {
                shoulder,
                hip_left,
                hip_right,
                torso_height,
                hip_center,
                neck_angle,
                neck_start,
                neck_end,
                bridge,
            },
            pick,
            fret_wrist,
        })
    }
}

impl Default for InstrumentModel {
    fn default() -> Self {
        Self::new()
    }
}
