//! # Simulation モジュール
//!
//! 深海養殖シミュレーションの実行エンジンを提供します。
//!
//! 固定回数のティックを実行し、水槽内のAUVスウォームと屋外UAVを
//! 同じ乱数シードから決定的に駆動します。
//!
//! ## ティック処理順序
//!
//! 1. **環境処理**: 水質のランダムウォーク
//! 2. **魚群処理**: 水槽内の魚の移動
//! 3. **スウォーム処理**: AUVの位置・バッテリー更新
//! 4. **観測処理**: 魚の観測記録
//! 5. **UAV処理**: 状態更新と魚群探知スキャン
//!
//! `run_realtime` はtokioのタイマーでティック間隔を実時間に合わせるため、
//! 魚群探知機のクールダウン（実時間）が意味を持ちます。

use crate::models::*;
use crate::scenario::ScenarioConfig;
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// 乱数ストリームの識別子（同一シードから独立した系列を得る）
const STREAM_SWARM: u64 = 1;
const STREAM_WORLD: u64 = 2;
const STREAM_UAV: u64 = 3;

pub struct SimulationEngine {
    pub step_count: u64,
    pub swarm: Swarm,
    pub fish_school: FishSchool,
    pub environment: Environment,
    pub uav: Option<UavSimulator>,
    pub scenario_config: ScenarioConfig,
    world_rng: ChaCha8Rng,
    clock: Arc<dyn Clock>,
    detections: Vec<DetectionRecord>,
}

/// UAVスキャン1回分の結果
#[derive(Debug, Clone, Serialize)]
pub struct DetectionRecord {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub fish_ids: Vec<String>,
}

/// シミュレーション結果レポート
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub scenario: String,
    pub timestamp: DateTime<Utc>,
    pub ticks: u64,
    pub environment: WaterQuality,
    pub swarm: SwarmStats,
    pub vehicles: Vec<Vehicle>,
    pub uav: Option<UavStatus>,
    pub detections: Vec<DetectionRecord>,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig) -> Self {
        Self::with_clock(scenario, Arc::new(SystemClock))
    }

    pub fn with_clock(scenario: ScenarioConfig, clock: Arc<dyn Clock>) -> Self {
        let seed = scenario.sim.seed;
        let stream = |id: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(id);
            rng
        };

        let mut world_rng = stream(STREAM_WORLD);
        let swarm = Swarm::new(
            scenario.swarm.vehicle_count,
            scenario.tank,
            scenario.swarm.clone(),
            stream(STREAM_SWARM),
        )
        .with_clock(clock.clone());
        let fish_school = FishSchool::new(&scenario.fish_school, scenario.tank, &mut world_rng);
        let environment = Environment::new(scenario.environment.clone());
        let uav = scenario
            .uav
            .enabled
            .then(|| UavSimulator::with_clock(&scenario.uav, stream(STREAM_UAV), clock.clone()));

        info!("シミュレーション初期化: AUV {}機, 魚 {}匹, UAV {}",
              swarm.vehicles().len(),
              fish_school.fish().len(),
              if uav.is_some() { "有効" } else { "無効" });

        Self {
            step_count: 0,
            swarm,
            fish_school,
            environment,
            uav,
            scenario_config: scenario,
            world_rng,
            clock,
            detections: Vec::new(),
        }
    }

    /// 全ティックを即時実行
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("=== シミュレーション実行開始 ===");

        while self.step_count < self.scenario_config.sim.ticks {
            self.step()?;
        }

        self.log_completion();
        Ok(())
    }

    /// ティック間隔を実時間に合わせて実行
    pub async fn run_realtime(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let period = std::time::Duration::from_millis(self.scenario_config.sim.tick_interval_ms.max(1));
        let mut interval = tokio::time::interval(period);
        info!("=== リアルタイム実行開始 (間隔: {:?}) ===", period);

        while self.step_count < self.scenario_config.sim.ticks {
            interval.tick().await;
            self.step()?;
        }

        self.log_completion();
        Ok(())
    }

    /// 1ティック進める
    pub fn step(&mut self) -> Result<(), SwarmError> {
        self.environment.update_conditions(&mut self.world_rng);
        self.fish_school.swim(&mut self.world_rng);

        let positions = self.fish_school.positions();
        let ids = self.fish_school.ids();
        self.swarm.advance(&positions);
        let recorded = self.swarm.record_observations(&positions, &ids)?;

        if let Some(uav) = self.uav.as_mut() {
            uav.update_status();
            let detected = uav.detected_fish();
            if !detected.is_empty() {
                self.detections.push(DetectionRecord {
                    tick: self.step_count,
                    timestamp: self.clock.now(),
                    fish_ids: detected.into_iter().map(|f| f.id).collect(),
                });
            }
        }

        self.step_count += 1;
        debug!("ティック {}: 観測 {}件", self.step_count, recorded);

        if self.step_count % self.scenario_config.sim.progress_every == 0 {
            let stats = self.swarm.statistics();
            let progress = self.step_count as f64 / self.scenario_config.sim.ticks as f64 * 100.0;
            info!("進行状況: {:.1}% (稼働AUV: {}, 平均バッテリー: {:.3}, 観測数: {})",
                  progress, stats.active_vehicles, stats.average_battery, stats.total_observations);
        }

        Ok(())
    }

    pub fn detections(&self) -> &[DetectionRecord] {
        &self.detections
    }

    /// 現在の状態からレポートを作成
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            scenario: self.scenario_config.meta.name.clone(),
            timestamp: self.clock.now(),
            ticks: self.step_count,
            environment: self.environment.statistics(),
            swarm: self.swarm.statistics(),
            vehicles: self.swarm.vehicles().to_vec(),
            uav: self.uav.as_ref().map(|u| u.status().clone()),
            detections: self.detections.clone(),
        }
    }

    fn log_completion(&self) {
        let stats = self.swarm.statistics();
        info!("=== シミュレーション完了 ===");
        info!("総ティック数: {}", self.step_count);
        info!("追跡魚数: {}, 総観測数: {}", stats.tracked_fish, stats.total_observations);
        if let Some(uav) = &self.uav {
            info!("{}: 運用中={}, バッテリー={:.3}, 探知回数={} (探知範囲: {:.0}m)",
                  uav.get_id(), uav.is_active(), uav.status().battery_level,
                  self.detections.len(), uav.fish_finder().get_detection_range());
        }
    }
}

impl SimulationReport {
    /// レポートの概要を表示
    pub fn print_summary(&self) {
        println!("=== シミュレーション結果: {} ===", self.scenario);
        println!("ティック数: {}", self.ticks);
        println!();

        println!("=== 水質 ===");
        println!("水温: {:.2}℃  pH: {:.2}  溶存酸素: {:.2}mg/L  塩分: {:.2}ppt",
                 self.environment.temperature, self.environment.ph,
                 self.environment.oxygen, self.environment.salinity);
        println!();

        println!("=== AUVスウォーム ===");
        println!("稼働機: {}  平均バッテリー: {:.3}", self.swarm.active_vehicles, self.swarm.average_battery);
        println!("追跡魚数: {}  総観測数: {}", self.swarm.tracked_fish, self.swarm.total_observations);
        for v in &self.vehicles {
            println!("  {}: ({:.2}, {:.2}, {:.2}) バッテリー {:.3} [{}]",
                     v.id, v.position.x, v.position.y, v.position.z, v.battery_level, v.mission);
        }

        if let Some(uav) = &self.uav {
            println!();
            println!("=== UAV ===");
            println!("位置: ({:.5}, {:.5})  バッテリー: {:.3}  運用中: {}",
                     uav.position.lat, uav.position.lon, uav.battery_level, uav.is_operational);
            let total: usize = self.detections.iter().map(|d| d.fish_ids.len()).sum();
            println!("スキャン成功: {}回  探知総数: {}匹", self.detections.len(), total);
        }
    }

    /// YAML形式で書き出す
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn scenario(ticks: u64) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.sim.ticks = ticks;
        config.sim.progress_every = 10;
        config
    }

    #[test]
    fn test_run_completes_all_ticks() {
        let mut engine = SimulationEngine::new(scenario(50));
        engine.run().unwrap();

        let report = engine.report();
        assert_eq!(report.ticks, 50);
        assert_eq!(report.vehicles.len(), 3);
        let bounds = engine.swarm.bounds();
        assert!(report.vehicles.iter().all(|v| bounds.contains(&v.position)));
        assert!(report.uav.is_some());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        let mut a = SimulationEngine::with_clock(scenario(30), clock.clone());
        let mut b = SimulationEngine::with_clock(scenario(30), clock.clone());
        a.run().unwrap();
        b.run().unwrap();

        for (va, vb) in a.swarm.vehicles().iter().zip(b.swarm.vehicles()) {
            assert_eq!(va.position, vb.position);
        }
        assert_eq!(a.swarm.statistics(), b.swarm.statistics());
    }

    #[test]
    fn test_scan_cooldown_follows_clock() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
        let mut config = scenario(10);
        config.uav.spawn_spread_deg = 0.0001;
        let mut engine = SimulationEngine::with_clock(config, clock.clone());

        // 時刻が進まなければ最初の1回しかスキャンできない
        for _ in 0..5 {
            engine.step().unwrap();
        }
        assert_eq!(engine.detections().len(), 1);

        for _ in 0..5 {
            clock.advance(Duration::seconds(5));
            engine.step().unwrap();
        }
        assert_eq!(engine.detections().len(), 6);
    }

    #[test]
    fn test_disabled_uav() {
        let mut config = scenario(5);
        config.uav.enabled = false;
        let mut engine = SimulationEngine::new(config);
        engine.run().unwrap();
        assert!(engine.report().uav.is_none());
        assert!(engine.detections().is_empty());
    }

    #[test]
    fn test_report_serializes_to_yaml() {
        let mut engine = SimulationEngine::new(scenario(3));
        engine.run().unwrap();
        let yaml = engine.report().to_yaml().unwrap();
        assert!(yaml.contains("swarm:"));
        assert!(yaml.contains("total_observations"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_run_realtime() {
        let mut config = scenario(3);
        config.sim.tick_interval_ms = 1000;
        let mut engine = SimulationEngine::new(config);
        engine.run_realtime().await.unwrap();
        assert_eq!(engine.step_count, 3);
    }
}
