use crate::models::{
    clock::{Clock, SystemClock},
    common::GeoPoint,
    fish::Fish,
    traits::ISensor,
};
use crate::scenario::FishFinderConfig;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::trace;

/// 魚群探知機
///
/// 探知機全体で1つのクールダウンを共有します（魚ごと・呼び出し元ごとではない）。
/// 距離は緯度経度の平面近似 `sqrt(Δlat² + Δlon²) × 111000` で計算します。
pub struct FishFinder {
    detection_range_m: f64,
    scan_interval: Duration,
    last_scan: Option<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl FishFinder {
    /// 新しい魚群探知機を作成
    ///
    /// # 引数
    ///
    /// * `detection_range_m` - 探知範囲（m）
    /// * `scan_interval` - 最小スキャン間隔
    pub fn new(detection_range_m: f64, scan_interval: Duration) -> Self {
        Self {
            detection_range_m,
            scan_interval,
            last_scan: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(config: &FishFinderConfig) -> Self {
        let interval_ms = (config.scan_interval_s * 1000.0).round() as i64;
        Self::new(config.detection_range_m, Duration::milliseconds(interval_ms))
    }

    /// 時刻源を差し替える
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn last_scan(&self) -> Option<DateTime<Utc>> {
        self.last_scan
    }

    /// スキャン可能かどうか
    ///
    /// 未スキャン、または前回スキャンから間隔以上経過していればtrue
    pub fn can_scan(&self) -> bool {
        match self.last_scan {
            None => true,
            Some(last) => self.clock.now() - last >= self.scan_interval,
        }
    }

    /// 探知範囲内の魚をスキャン
    ///
    /// クールダウン中は空の結果を返し、タイマーは更新しません。
    pub fn scan<'a>(&mut self, vehicle_position: &GeoPoint, targets: &'a [Fish]) -> Vec<&'a Fish> {
        if !self.can_scan() {
            trace!("スキャン拒否: クールダウン中");
            return Vec::new();
        }

        self.last_scan = Some(self.clock.now());

        targets
            .iter()
            .filter(|fish| vehicle_position.flat_distance(&fish.position) <= self.detection_range_m)
            .collect()
    }
}

impl ISensor for FishFinder {
    fn get_detection_range(&self) -> f64 {
        self.detection_range_m
    }

    fn is_ready(&self) -> bool {
        self.can_scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clock::ManualClock;
    use crate::models::fish::Species;
    use chrono::TimeZone;

    fn fish(id: &str, lat: f64, lon: f64) -> Fish {
        Fish {
            id: id.to_string(),
            position: GeoPoint::new(lat, lon, -2.0),
            species: Species::Trout,
            size_m: 0.5,
            last_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn finder() -> (FishFinder, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let finder = FishFinder::from_config(&FishFinderConfig::default()).with_clock(clock.clone());
        (finder, clock)
    }

    #[test]
    fn test_scan_within_range() {
        let (mut finder, _) = finder();
        let population = vec![fish("near", 0.0001, 0.0001), fish("far", 0.01, 0.01)];

        let detected = finder.scan(&GeoPoint::default(), &population);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].id, "near");
    }

    #[test]
    fn test_range_uses_flat_approximation() {
        let (mut finder, _) = finder();
        // 0.0004° ≈ 44.4m, 0.0005° ≈ 55.5m
        let population = vec![fish("inside", 0.0, 0.0004), fish("outside", 0.0, 0.0005)];

        let detected = finder.scan(&GeoPoint::default(), &population);
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].id, "inside");
    }

    #[test]
    fn test_immediate_second_scan_is_empty() {
        let (mut finder, _) = finder();
        let population = vec![fish("near", 0.0001, 0.0001)];
        let origin = GeoPoint::default();

        assert_eq!(finder.scan(&origin, &population).len(), 1);
        assert!(!finder.can_scan());
        assert!(finder.scan(&origin, &population).is_empty());
    }

    #[test]
    fn test_denied_scan_does_not_reset_cooldown() {
        let (mut finder, clock) = finder();
        let population = vec![fish("near", 0.0001, 0.0001)];
        let origin = GeoPoint::default();

        finder.scan(&origin, &population);
        let first = finder.last_scan();

        clock.advance(Duration::seconds(3));
        assert!(finder.scan(&origin, &population).is_empty());
        assert_eq!(finder.last_scan(), first);

        clock.advance(Duration::seconds(2));
        assert!(finder.can_scan());
        assert_eq!(finder.scan(&origin, &population).len(), 1);
    }

    #[test]
    fn test_empty_population() {
        let (mut finder, _) = finder();
        assert!(finder.scan(&GeoPoint::default(), &[]).is_empty());
        assert!(finder.last_scan().is_some());
        assert_eq!(finder.get_detection_range(), 50.0);
    }
}
