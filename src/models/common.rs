use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul};

/// 水槽ローカル座標系での3次元位置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f64, // m
    pub y: f64, // m
    pub z: f64, // m (水深方向)
}

impl Position3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// 3次元ユークリッド距離を計算
    pub fn distance_3d(&self, other: &Position3D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// `other` から自分への変位ベクトル
    pub fn offset_from(&self, other: &Position3D) -> Velocity3D {
        Velocity3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// 自分から `other` への単位方向ベクトル（同一点ならゼロ）
    pub fn direction_to(&self, other: &Position3D) -> Velocity3D {
        other.offset_from(self).normalize()
    }
}

// 1ティック分の移動: position += velocity
impl Add<Velocity3D> for Position3D {
    type Output = Self;

    fn add(self, velocity: Velocity3D) -> Self::Output {
        Self::new(self.x + velocity.x, self.y + velocity.y, self.z + velocity.z)
    }
}

impl AddAssign<Velocity3D> for Position3D {
    fn add_assign(&mut self, velocity: Velocity3D) {
        *self = *self + velocity;
    }
}

/// 3次元速度（1ティックあたりの変位, m/tick）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Velocity3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// 速度ベクトルの大きさ
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 速度ベクトルを正規化（ゼロベクトルはそのまま）
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag, self.z / mag)
        } else {
            *self
        }
    }
}

impl Add for Velocity3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Velocity3D {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Mul<f64> for Velocity3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// 水槽の境界ボックス（原点基準、各軸 [0, max]）
///
/// 水槽内シミュレーション専用の平面フェンスです。
/// 屋外の緯度経度フェンスは [`crate::models::geofence::GeoFence`] を使用します。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankBounds {
    pub x_max_m: f64,
    pub y_max_m: f64,
    pub z_max_m: f64,
}

impl Default for TankBounds {
    fn default() -> Self {
        Self {
            x_max_m: 10.0,
            y_max_m: 10.0,
            z_max_m: 5.0,
        }
    }
}

impl TankBounds {
    pub fn new(x_max_m: f64, y_max_m: f64, z_max_m: f64) -> Self {
        Self { x_max_m, y_max_m, z_max_m }
    }

    /// 位置が境界ボックス内（境界上を含む）かどうか
    pub fn contains(&self, position: &Position3D) -> bool {
        (0.0..=self.x_max_m).contains(&position.x)
            && (0.0..=self.y_max_m).contains(&position.y)
            && (0.0..=self.z_max_m).contains(&position.z)
    }

    /// 境界での反射処理
    ///
    /// 軸ごとに独立して判定し、はみ出した座標を境界にクランプし、
    /// 対応する速度成分に `-restitution` を掛けます。
    ///
    /// # 戻り値
    ///
    /// いずれかの軸で反射が発生した場合はtrue
    pub fn reflect(&self, position: &mut Position3D, velocity: &mut Velocity3D, restitution: f64) -> bool {
        let bx = reflect_axis(&mut position.x, &mut velocity.x, self.x_max_m, restitution);
        let by = reflect_axis(&mut position.y, &mut velocity.y, self.y_max_m, restitution);
        let bz = reflect_axis(&mut position.z, &mut velocity.z, self.z_max_m, restitution);
        bx || by || bz
    }
}

fn reflect_axis(coord: &mut f64, velocity: &mut f64, max: f64, restitution: f64) -> bool {
    if *coord < 0.0 {
        *coord = 0.0;
    } else if *coord > max {
        *coord = max;
    } else {
        return false;
    }
    *velocity *= -restitution;
    true
}

/// 緯度経度座標（度）と高度（m）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    /// ハーバーサイン公式による大圏距離（m）。高度は使用しない。
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let lat1 = math_utils::deg_to_rad(self.lat);
        let lat2 = math_utils::deg_to_rad(other.lat);
        let dlat = lat2 - lat1;
        let dlon = math_utils::deg_to_rad(other.lon - self.lon);

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// 平面近似距離（m）: sqrt(Δlat² + Δlon²) × 111000
    ///
    /// 魚群探知機用の簡易計算。ハーバーサインより粗いが安価。
    pub fn flat_distance(&self, other: &GeoPoint) -> f64 {
        ((self.lat - other.lat).powi(2) + (self.lon - other.lon).powi(2)).sqrt() * METERS_PER_DEGREE
    }
}

/// 地球半径（m）
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// 緯度経度1度あたりの概算距離（m）
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// 値を [min, max] に収める（NaNはminに寄せる）
    pub fn clip(value: f64, min: f64, max: f64) -> f64 {
        if value.is_nan() { min } else { value.clamp(min, max) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_to_is_unit_or_zero() {
        let a = Position3D::new(1.0, 1.0, 1.0);
        let b = Position3D::new(4.0, 5.0, 1.0);
        let dir = a.direction_to(&b);
        assert!((dir.magnitude() - 1.0).abs() < 1e-12);
        assert!((dir.x - 0.6).abs() < 1e-12);
        assert!((dir.y - 0.8).abs() < 1e-12);

        assert_eq!(a.direction_to(&a), Velocity3D::zero());
    }

    #[test]
    fn test_reflect_clamps_and_halves_velocity() {
        let bounds = TankBounds::default();
        let mut pos = Position3D::new(10.5, -0.2, 2.0);
        let mut vel = Velocity3D::new(1.0, -0.4, 0.3);

        assert!(bounds.reflect(&mut pos, &mut vel, 0.5));
        assert_eq!(pos, Position3D::new(10.0, 0.0, 2.0));
        assert_eq!(vel, Velocity3D::new(-0.5, 0.2, 0.3));
        assert!(bounds.contains(&pos));
    }

    #[test]
    fn test_reflect_inside_is_noop() {
        let bounds = TankBounds::default();
        let mut pos = Position3D::new(10.0, 0.0, 5.0);
        let mut vel = Velocity3D::new(1.0, 1.0, 1.0);
        assert!(!bounds.reflect(&mut pos, &mut vel, 0.5));
        assert_eq!(vel, Velocity3D::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_haversine_one_degree_on_equator() {
        let a = GeoPoint::new(0.0, 0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0, 100.0);
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((a.haversine_distance(&b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_flat_distance() {
        let a = GeoPoint::new(0.0, 0.0, 0.0);
        let b = GeoPoint::new(0.0003, 0.0004, -3.0);
        assert!((a.flat_distance(&b) - 55.5).abs() < 1e-9);
    }

    #[test]
    fn test_clip() {
        assert_eq!(math_utils::clip(9.0, 6.5, 8.5), 8.5);
        assert_eq!(math_utils::clip(f64::NAN, 6.5, 8.5), 6.5);
    }
}
