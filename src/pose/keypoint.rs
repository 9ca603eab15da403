use crate::geometry::Point;

/// PoseNet / MoveNet の 17 キーポイントインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub const ALL: [KeypointIndex; KeypointIndex::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// PoseNet のパーツ名 (`leftWrist`)
    pub fn part_name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "leftEye",
            Self::RightEye => "rightEye",
            Self::LeftEar => "leftEar",
            Self::RightEar => "rightEar",
            Self::LeftShoulder => "leftShoulder",
            Self::RightShoulder => "rightShoulder",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftWrist => "leftWrist",
            Self::RightWrist => "rightWrist",
            Self::LeftHip => "leftHip",
            Self::RightHip => "rightHip",
            Self::LeftKnee => "leftKnee",
            Self::RightKnee => "rightKnee",
            Self::LeftAnkle => "leftAnkle",
            Self::RightAnkle => "rightAnkle",
        }
    }

    /// パーツ名から変換
    ///
    /// PoseNet の camelCase (`leftWrist`) と snake_case (`left_wrist`) を受け付ける。
    pub fn from_part_name(name: &str) -> Option<Self> {
        let normalized: String = name.chars().filter(|c| *c != '_').collect();
        Self::ALL
            .iter()
            .copied()
            .find(|idx| idx.part_name().eq_ignore_ascii_case(&normalized))
    }

    /// 左右を入れ替えたインデックス (鼻はそのまま)
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Nose => Self::Nose,
            Self::LeftEye => Self::RightEye,
            Self::RightEye => Self::LeftEye,
            Self::LeftEar => Self::RightEar,
            Self::RightEar => Self::LeftEar,
            Self::LeftShoulder => Self::RightShoulder,
            Self::RightShoulder => Self::LeftShoulder,
            Self::LeftElbow => Self::RightElbow,
            Self::RightElbow => Self::LeftElbow,
            Self::LeftWrist => Self::RightWrist,
            Self::RightWrist => Self::LeftWrist,
            Self::LeftHip => Self::RightHip,
            Self::RightHip => Self::LeftHip,
            Self::LeftKnee => Self::RightKnee,
            Self::RightKnee => Self::LeftKnee,
            Self::LeftAnkle => Self::RightAnkle,
            Self::RightAnkle => Self::LeftAnkle,
        }
    }
}

/// 単一キーポイント
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// X座標 (ピクセル)
    pub x: f32,
    /// Y座標 (ピクセル、下向きが正)
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// 信頼度が閾値を超えているか (閾値ちょうどは無効)
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Default for Keypoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            confidence: 0.0,
        }
    }
}

/// 17キーポイントからなる姿勢 (1フレーム分)
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// インデックスでキーポイントを取得
    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    pub fn set(&mut self, index: KeypointIndex, keypoint: Keypoint) {
        self.keypoints[index as usize] = keypoint;
    }

    /// 全キーポイントの平均信頼度
    pub fn average_confidence(&self) -> f32 {
        let sum: f32 = self.keypoints.iter().map(|k| k.confidence).sum();
        sum / KeypointIndex::COUNT as f32
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            keypoints: [Keypoint::default(); KeypointIndex::COUNT],
        }
    }
}
