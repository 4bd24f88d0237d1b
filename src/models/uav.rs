use crate::models::{
    clock::{Clock, SystemClock},
    common::GeoPoint,
    environment::WaterQuality,
    fish::{Fish, Species},
    fish_finder::FishFinder,
    geofence::GeoFence,
    traits::IAgent,
};
use crate::scenario::UavConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// UAVの状態
#[derive(Debug, Clone, Serialize)]
pub struct UavStatus {
    pub position: GeoPoint,
    pub battery_level: f64,
    pub water_quality: WaterQuality,
    pub is_operational: bool,
    pub last_maintenance: DateTime<Utc>,
}

/// 屋外展開UAVシミュレーター
///
/// 緯度経度ジオフェンスと魚群探知機を搭載し、周辺の魚群をスキャンします。
/// フェンス外に出ると運用停止となり、整備で復帰します。
pub struct UavSimulator {
    status: UavStatus,
    fence: GeoFence,
    fish_finder: FishFinder,
    fish_population: Vec<Fish>,
    battery_drain_per_tick: f64,
    rng: ChaCha8Rng,
    clock: Arc<dyn Clock>,
}

impl UavSimulator {
    pub fn new(config: &UavConfig, rng: ChaCha8Rng) -> Self {
        Self::with_clock(config, rng, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &UavConfig, mut rng: ChaCha8Rng, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let fish_population = spawn_population(config, &mut rng, now);

        Self {
            status: UavStatus {
                position: config.start_position,
                battery_level: 1.0,
                water_quality: WaterQuality {
                    temperature: 25.0,
                    ph: 7.0,
                    oxygen: 8.0,
                    salinity: 35.0,
                    turbidity: 1.0,
                },
                is_operational: true,
                last_maintenance: now,
            },
            fence: GeoFence::new(config.fence_center, config.fence_radius_m),
            fish_finder: FishFinder::from_config(&config.fish_finder).with_clock(clock.clone()),
            fish_population,
            battery_drain_per_tick: config.battery_drain_per_tick,
            rng,
            clock,
        }
    }

    pub fn status(&self) -> &UavStatus {
        &self.status
    }

    pub fn fence(&self) -> &GeoFence {
        &self.fence
    }

    pub fn fish_population(&self) -> &[Fish] {
        &self.fish_population
    }

    pub fn fish_finder(&self) -> &FishFinder {
        &self.fish_finder
    }

    /// UAVを移動させる（外部の航法制御から呼び出す）
    pub fn set_position(&mut self, position: GeoPoint) {
        self.status.position = position;
    }

    pub fn set_fish_population(&mut self, fish: Vec<Fish>) {
        self.fish_population = fish;
    }

    /// 状態を1ステップ更新
    ///
    /// バッテリー消費、水質の揺らぎ、ジオフェンス判定、魚群の移動を行います。
    pub fn update_status(&mut self) {
        self.status.battery_level = (self.status.battery_level - self.battery_drain_per_tick).max(0.0);

        let wq = &mut self.status.water_quality;
        wq.temperature += self.rng.gen_range(-0.1..0.1);
        wq.ph = (wq.ph + self.rng.gen_range(-0.01..0.01)).clamp(0.0, 14.0);
        wq.oxygen = (wq.oxygen + self.rng.gen_range(-0.1..0.1)).max(0.0);

        if self.status.is_operational && !self.fence.contains(&self.status.position) {
            warn!("ジオフェンス逸脱: ({:.5}, {:.5}) 中心から{:.0}m",
                  self.status.position.lat,
                  self.status.position.lon,
                  self.fence.distance_from_center(&self.status.position));
            self.status.is_operational = false;
        }

        for fish in &mut self.fish_population {
            fish.position.lat += self.rng.gen_range(-0.0001..0.0001);
            fish.position.lon += self.rng.gen_range(-0.0001..0.0001);
            fish.position.alt += self.rng.gen_range(-0.1..0.1);
        }
    }

    /// 魚群探知機でスキャン
    ///
    /// クールダウン中は空。探知された魚の `last_seen` を更新して返します。
    pub fn detected_fish(&mut self) -> Vec<Fish> {
        let detected_ids: Vec<String> = self
            .fish_finder
            .scan(&self.status.position, &self.fish_population)
            .into_iter()
            .map(|f| f.id.clone())
            .collect();

        if detected_ids.is_empty() {
            return Vec::new();
        }

        let now = self.clock.now();
        debug!("魚群探知: {}匹", detected_ids.len());
        self.fish_population
            .iter_mut()
            .filter(|f| detected_ids.contains(&f.id))
            .map(|f| {
                f.last_seen = now;
                f.clone()
            })
            .collect()
    }

    /// 整備: バッテリー満充電、運用復帰
    pub fn perform_maintenance(&mut self) {
        self.status.battery_level = 1.0;
        self.status.is_operational = true;
        self.status.last_maintenance = self.clock.now();
        debug!("UAV整備完了");
    }
}

impl IAgent for UavSimulator {
    fn get_id(&self) -> String {
        "UAV-001".to_string()
    }

    fn is_active(&self) -> bool {
        self.status.is_operational && self.status.battery_level > 0.0
    }
}

fn spawn_population(config: &UavConfig, rng: &mut ChaCha8Rng, now: DateTime<Utc>) -> Vec<Fish> {
    let spread = config.spawn_spread_deg;
    let center = config.fence_center;
    (0..config.fish_population)
        .map(|i| Fish {
            id: format!("fish_{}", i),
            position: GeoPoint::new(
                center.lat + rng.gen_range(-1.0..=1.0) * spread,
                center.lon + rng.gen_range(-1.0..=1.0) * spread,
                rng.gen_range(-5.0..=-1.0),
            ),
            species: *Species::ALL.choose(rng).unwrap_or(&Species::Bass),
            size_m: rng.gen_range(0.2..=1.0),
            last_seen: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn simulator() -> (UavSimulator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()));
        let uav = UavSimulator::with_clock(&UavConfig::default(), ChaCha8Rng::seed_from_u64(21), clock.clone());
        (uav, clock)
    }

    fn test_fish(id: &str, position: GeoPoint) -> Fish {
        Fish {
            id: id.to_string(),
            position,
            species: Species::Salmon,
            size_m: 0.5,
            last_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_initialization() {
        let (uav, _) = simulator();
        assert_eq!(uav.status().battery_level, 1.0);
        assert!(uav.status().is_operational);
        assert_eq!(uav.fish_population().len(), 50);
        let species: HashSet<Species> = uav.fish_population().iter().map(|f| f.species).collect();
        assert!(species.len() > 1);
    }

    #[test]
    fn test_fence() {
        let (uav, _) = simulator();
        assert!(uav.fence().contains(&GeoPoint::new(0.0, 0.0, 0.0)));
        assert!(!uav.fence().contains(&GeoPoint::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_battery_drain() {
        let (mut uav, _) = simulator();
        uav.update_status();
        assert!(uav.status().battery_level < 1.0);
    }

    #[test]
    fn test_leaving_fence_stops_operation_until_maintenance() {
        let (mut uav, clock) = simulator();
        uav.set_position(GeoPoint::new(1.0, 1.0, 0.0));
        uav.update_status();
        assert!(!uav.status().is_operational);
        assert!(!uav.is_active());

        clock.advance(Duration::hours(1));
        uav.set_position(GeoPoint::default());
        uav.perform_maintenance();
        assert!(uav.status().is_operational);
        assert_eq!(uav.status().battery_level, 1.0);
        assert_eq!(uav.status().last_maintenance, clock.now());
    }

    #[test]
    fn test_water_quality_bounds() {
        let (mut uav, _) = simulator();
        for _ in 0..100 {
            uav.update_status();
            let wq = uav.status().water_quality;
            assert!((0.0..=14.0).contains(&wq.ph));
            assert!(wq.temperature > 0.0);
            assert!(wq.oxygen > 0.0);
        }
    }

    #[test]
    fn test_fish_movement() {
        let (mut uav, _) = simulator();
        let before: Vec<GeoPoint> = uav.fish_population().iter().map(|f| f.position).collect();
        uav.update_status();
        for (fish, old) in uav.fish_population().iter().zip(&before) {
            assert_ne!(fish.position, *old);
        }
    }

    #[test]
    fn test_detected_fish_and_scan_interval() {
        let (mut uav, clock) = simulator();
        uav.set_fish_population(vec![
            test_fish("test_fish", GeoPoint::new(0.0001, 0.0001, -2.0)),
            test_fish("distant", GeoPoint::new(0.005, 0.005, -2.0)),
        ]);

        let detected = uav.detected_fish();
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].id, "test_fish");
        assert_eq!(detected[0].last_seen, clock.now());

        assert!(uav.detected_fish().is_empty());

        clock.advance(Duration::seconds(5));
        assert_eq!(uav.detected_fish().len(), 1);
    }
}
