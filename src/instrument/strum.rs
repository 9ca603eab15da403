use crate::geometry::{segments_intersect, Point};

/// ピックの軌跡がネックを横切ったらストロークとみなす
///
/// 前フレームのピック位置だけを保持する。最初のフレームでは比較対象が
/// ないので必ず不発。
#[derive(Debug, Default)]
pub struct StrumDetector {
    last_pick: Option<Point>,
}

impl StrumDetector {
    pub fn new() -> Self {
        Self { last_pick: None }
    }

    /// 今フレームのピック位置で判定し、保持値を更新する
    ///
    /// 発火条件: 線分 (pick → last_pick) が線分 (neck_end → bridge) と交差し、
    /// かつ `pick.y < last_pick.y` (画面上で上向き = 振り下ろし)。
    /// 結果に関わらず `last_pick` は今回のピックで上書きする。
    pub fn update(&mut self, pick: Point, neck_end: Point, bridge: Point) -> bool {
        let strummed = match self.last_pick {
            Some(last) => segments_intersect(pick, last, neck_end, bridge) && pick.y < last.y,
            None => false,
        };
        self.last_pick = Some(pick);
        strummed
    }

    pub fn last_pick(&self) -> Option<Point> {
        self.last_pick
    }
}
