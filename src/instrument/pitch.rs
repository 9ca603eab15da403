use crate::config::{DistanceMode, PitchConfig};
use crate::geometry::{round_half_up, Point};

/// ネック上の手首位置をピッチオフセット (半音) に変換する
///
/// `t = 1 - |wrist - neck_start| / |neck_end - neck_start|`、
/// `offset = round(t * range)`。手首がネック始点にあれば `range`、
/// 終点にあれば 0。
#[derive(Debug, Clone)]
pub struct PitchMapper {
    range: i32,
    distance: DistanceMode,
    clamp: bool,
}

impl PitchMapper {
    pub fn new(range: i32, distance: DistanceMode, clamp: bool) -> Self {
        Self {
            range,
            distance,
            clamp,
        }
    }

    pub fn from_config(config: &PitchConfig) -> Self {
        Self::new(config.range, config.distance, config.clamp)
    }

    /// ピッチオフセットを計算
    ///
    /// `clamp` が無効なら `t` が [0, 1] を外れた結果もそのまま返す。
    /// ネック長が 0 の場合は `t` が有限でなくなり、`as i32` の飽和変換に従う。
    pub fn map(&self, wrist: Point, neck_start: Point, neck_end: Point) -> i32 {
        let t = 1.0 - self.measure(&wrist, &neck_start) / self.measure(&neck_end, &neck_start);
        let offset = round_half_up(t * self.range as f32) as i32;
        if self.clamp {
            offset.clamp(0, self.range.max(0))
        } else {
            offset
        }
    }

    fn measure(&self, from: &Point, to: &Point) -> f32 {
        match self.distance {
            DistanceMode::Euclidean => from.distance(to),
            DistanceMode::Legacy => legacy_distance(from, to),
        }
    }
}

impl Default for PitchMapper {
    fn default() -> Self {
        Self::from_config(&PitchConfig::default())
    }
}

/// 旧実装の擬似距離。y 成分にも `from.x` を使う
fn legacy_distance(from: &Point, to: &Point) -> f32 {
    let dx = from.x - to.x;
    let dy = from.x - to.y;
    (dx * dx + dy * dy).sqrt()
}
