use crate::models::common::GeoPoint;
use serde::Serialize;

/// 緯度経度ジオフェンス（円形）
///
/// 屋外展開用の境界判定です。距離はハーバーサイン公式による大圏距離で、
/// 高度は判定に使用しません。水槽内の平面境界は
/// [`crate::models::common::TankBounds`] を使用し、両者は混在させません。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoFence {
    center: GeoPoint,
    radius_m: f64,
}

impl GeoFence {
    pub fn new(center: GeoPoint, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// 中心からの大圏距離（m）
    pub fn distance_from_center(&self, point: &GeoPoint) -> f64 {
        self.center.haversine_distance(point)
    }

    /// 点がフェンス内（境界上を含む）かどうか
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.distance_from_center(point) <= self.radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_always_inside() {
        let center = GeoPoint::new(35.6, 139.7, 0.0);
        for radius in [0.0, 1.0, 1000.0] {
            assert!(GeoFence::new(center, radius).contains(&GeoPoint::new(35.6, 139.7, -20.0)));
        }
    }

    #[test]
    fn test_origin_fence() {
        let fence = GeoFence::new(GeoPoint::default(), 1000.0);
        assert!(fence.contains(&GeoPoint::new(0.0, 0.0, 0.0)));
        assert!(fence.contains(&GeoPoint::new(0.005, 0.005, 0.0)));
        assert!(!fence.contains(&GeoPoint::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_point_beyond_radius_is_outside() {
        let fence = GeoFence::new(GeoPoint::default(), 500.0);
        let point = GeoPoint::new(0.0, 0.0045, 0.0);
        assert!(fence.distance_from_center(&point) > 500.0);
        assert!(!fence.contains(&point));
    }
}
