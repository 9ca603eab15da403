//! Image-space 2D helpers shared by the instrument model.
//!
//! Coordinates are pixels with the origin at the top-left and y growing
//! downward, exactly as the pose estimator reports them.

/// 画像座標上の点
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// ユークリッド距離
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// `self` から `target` への方向 (ラジアン)
    pub fn angle_to(&self, target: &Point) -> f32 {
        f32::atan2(target.y - self.y, target.x - self.x)
    }

    /// `angle` 方向へ `distance` 進んだ点を整数座標に丸めて返す
    ///
    /// `distance` が負なら逆方向に進む。
    pub fn offset_along(&self, angle: f32, distance: f32) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point::new(
            round_half_up(cos * distance + self.x),
            round_half_up(sin * distance + self.y),
        )
    }
}

/// Rounds to the nearest integer, with halves going toward +∞.
///
/// `f32::round` sends -2.5 to -3; the pose pipeline's historical output
/// sends it to -2, and both the neck points and the pitch offset rely on that.
pub fn round_half_up(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Returns true if segment `a`→`b` crosses segment `p`→`q`.
///
/// Both parametric positions must lie strictly inside (0, 1): touching at an
/// endpoint is not a crossing. Parallel and collinear segments (`det == 0`,
/// exact comparison) never cross, which also covers zero-length segments.
///
/// Everything is `f32`, like the keypoints. Near-parallel inputs that a
/// 64-bit evaluation would keep apart can produce `det == 0` here, and the
/// same goes for neck points that land right at a `.5` in [`round_half_up`].
pub fn segments_intersect(a: Point, b: Point, p: Point, q: Point) -> bool {
    let det = (b.x - a.x) * (q.y - p.y) - (q.x - p.x) * (b.y - a.y);
    if det == 0.0 {
        return false;
    }

    let lambda = ((q.y - p.y) * (q.x - a.x) + (p.x - q.x) * (q.y - a.y)) / det;
    let gamma = ((a.y - b.y) * (q.x - a.x) + (b.x - a.x) * (q.y - a.y)) / det;

    (0.0 < lambda && lambda < 1.0) && (0.0 < gamma && gamma < 1.0)
}
