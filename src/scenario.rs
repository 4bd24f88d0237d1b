use crate::models::common::{GeoPoint, Position3D, TankBounds};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "default".to_string(),
            description: "深海養殖タンク 標準構成".to_string(),
        }
    }
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 実行ティック数
    pub ticks: u64,
    pub seed: u64,
    /// リアルタイム実行時のティック間隔（ミリ秒）
    pub tick_interval_ms: u64,
    /// 進行状況ログの出力間隔（ティック）
    pub progress_every: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 240,
            seed: 42,
            tick_interval_ms: 1000,
            progress_every: 24,
        }
    }
}

/// AUVスウォーム設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub vehicle_count: usize,
    /// 魚への追従速度（m/tick）
    pub seek_speed: f64,
    pub seek_weight: f64,
    pub repulsion_weight: f64,
    /// 反発が働く機体間距離（未満）
    pub separation_radius_m: f64,
    /// 魚がいない場合のランダム速度の標準偏差
    pub jitter_std_dev: f64,
    pub battery_drain_per_tick: f64,
    /// この値未満で充電ステーションへ帰還
    pub low_battery_threshold: f64,
    pub charging_station: Position3D,
    pub return_speed: f64,
    pub docking_radius_m: f64,
    pub charge_per_tick: f64,
    /// 壁面反射の反発係数
    pub wall_restitution: f64,
    /// 観測が記録される最寄り機体との距離（未満）
    pub observation_radius_m: f64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            vehicle_count: 3,
            seek_speed: 0.5,
            seek_weight: 0.7,
            repulsion_weight: 0.3,
            separation_radius_m: 2.0,
            jitter_std_dev: 0.1,
            battery_drain_per_tick: 0.001,
            low_battery_threshold: 0.1,
            charging_station: Position3D::origin(),
            return_speed: 0.3,
            docking_radius_m: 0.1,
            charge_per_tick: 0.01,
            wall_restitution: 0.5,
            observation_radius_m: 2.0,
        }
    }
}

/// 水槽内の魚群設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FishSchoolConfig {
    pub count: usize,
    /// 1ティックあたりのランダムウォーク標準偏差（m）
    pub step_std_dev: f64,
}

impl Default for FishSchoolConfig {
    fn default() -> Self {
        Self {
            count: 20,
            step_std_dev: 0.2,
        }
    }
}

/// 水質ランダムウォークの1項目分の設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DriftConfig {
    pub initial: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl DriftConfig {
    pub fn new(initial: f64, std_dev: f64, min: f64, max: f64) -> Self {
        Self { initial, std_dev, min, max }
    }
}

/// 水槽環境（水質）設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub ph: DriftConfig,
    /// 溶存酸素（mg/L）
    pub oxygen: DriftConfig,
    /// 塩分（ppt）
    pub salinity: DriftConfig,
    /// 水温（℃）
    pub temperature: DriftConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            ph: DriftConfig::new(7.0, 0.1, 6.5, 8.5),
            oxygen: DriftConfig::new(8.0, 0.2, 6.0, 10.0),
            salinity: DriftConfig::new(35.0, 0.5, 30.0, 40.0),
            temperature: DriftConfig::new(15.0, 0.3, 10.0, 20.0),
        }
    }
}

/// 魚群探知機設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FishFinderConfig {
    pub detection_range_m: f64,
    /// 最小スキャン間隔（秒）
    pub scan_interval_s: f64,
}

impl Default for FishFinderConfig {
    fn default() -> Self {
        Self {
            detection_range_m: 50.0,
            scan_interval_s: 5.0,
        }
    }
}

/// 屋外UAV設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UavConfig {
    pub enabled: bool,
    pub start_position: GeoPoint,
    pub fence_center: GeoPoint,
    pub fence_radius_m: f64,
    pub fish_finder: FishFinderConfig,
    pub fish_population: usize,
    /// 初期配置の緯度経度の広がり（±度）
    pub spawn_spread_deg: f64,
    pub battery_drain_per_tick: f64,
}

impl Default for UavConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_position: GeoPoint::default(),
            fence_center: GeoPoint::default(),
            fence_radius_m: 1000.0,
            fish_finder: FishFinderConfig::default(),
            fish_population: 50,
            spawn_spread_deg: 0.01,
            battery_drain_per_tick: 0.001,
        }
    }
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub tank: TankBounds,
    pub swarm: SwarmConfig,
    pub fish_school: FishSchoolConfig,
    pub environment: EnvironmentConfig,
    pub uav: UavConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config = Self::from_yaml_str(&contents)
            .map_err(|e| match e {
                ScenarioError::ParseError(_, err) => ScenarioError::ParseError(path.to_path_buf(), err),
                other => other,
            })?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<string>"), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.sim.ticks == 0 {
            return Err(ScenarioError::ValidationError("sim.ticks must be positive".to_string()));
        }
        if self.sim.progress_every == 0 {
            return Err(ScenarioError::ValidationError("sim.progress_every must be positive".to_string()));
        }

        // 水槽サイズの検証
        let tank = &self.tank;
        if !(tank.x_max_m > 0.0 && tank.y_max_m > 0.0 && tank.z_max_m > 0.0) {
            return Err(ScenarioError::ValidationError("Tank bounds must be positive".to_string()));
        }

        // スウォーム設定の検証
        let swarm = &self.swarm;
        let non_negative = [
            ("swarm.seek_speed", swarm.seek_speed),
            ("swarm.separation_radius_m", swarm.separation_radius_m),
            ("swarm.jitter_std_dev", swarm.jitter_std_dev),
            ("swarm.battery_drain_per_tick", swarm.battery_drain_per_tick),
            ("swarm.return_speed", swarm.return_speed),
            ("swarm.docking_radius_m", swarm.docking_radius_m),
            ("swarm.charge_per_tick", swarm.charge_per_tick),
            ("swarm.wall_restitution", swarm.wall_restitution),
            ("swarm.observation_radius_m", swarm.observation_radius_m),
            ("fish_school.step_std_dev", self.fish_school.step_std_dev),
            ("uav.fence_radius_m", self.uav.fence_radius_m),
            ("uav.spawn_spread_deg", self.uav.spawn_spread_deg),
            ("uav.battery_drain_per_tick", self.uav.battery_drain_per_tick),
            ("uav.fish_finder.detection_range_m", self.uav.fish_finder.detection_range_m),
            ("uav.fish_finder.scan_interval_s", self.uav.fish_finder.scan_interval_s),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ScenarioError::ValidationError(format!("{} must be a non-negative number", name)));
            }
        }
        if !(swarm.seek_weight.is_finite() && swarm.repulsion_weight.is_finite()) {
            return Err(ScenarioError::ValidationError("Swarm weights must be finite".to_string()));
        }
        if !(0.0..=1.0).contains(&swarm.low_battery_threshold) {
            return Err(ScenarioError::ValidationError("swarm.low_battery_threshold must be in [0, 1]".to_string()));
        }

        // 充電ステーションは水槽内になければならない
        if !tank.contains(&swarm.charging_station) {
            return Err(ScenarioError::ValidationError("Charging station outside tank bounds".to_string()));
        }

        // 水質設定の検証
        let env = &self.environment;
        for (name, drift) in [
            ("ph", env.ph),
            ("oxygen", env.oxygen),
            ("salinity", env.salinity),
            ("temperature", env.temperature),
        ] {
            if drift.min > drift.max || !(drift.std_dev >= 0.0) {
                return Err(ScenarioError::ValidationError(format!("Invalid environment.{} drift", name)));
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("ティック数: {}", self.sim.ticks);
        println!("シード値: {}", self.sim.seed);
        println!("ティック間隔（リアルタイム時）: {}ms", self.sim.tick_interval_ms);
        println!();

        println!("=== 水槽 ===");
        println!("サイズ: {:.1} × {:.1} × {:.1} m", self.tank.x_max_m, self.tank.y_max_m, self.tank.z_max_m);
        println!("AUV: {}機", self.swarm.vehicle_count);
        println!("魚: {}匹", self.fish_school.count);
        println!();

        println!("=== 屋外UAV ===");
        if self.uav.enabled {
            println!("ジオフェンス半径: {:.0}m", self.uav.fence_radius_m);
            println!("探知範囲: {:.0}m (間隔: {:.1}秒)",
                     self.uav.fish_finder.detection_range_m,
                     self.uav.fish_finder.scan_interval_s);
            println!("魚群: {}匹", self.uav.fish_population);
        } else {
            println!("無効");
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_is_valid() {
        let config = ScenarioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.swarm.vehicle_count, 3);
        assert_eq!(config.tank, TankBounds::new(10.0, 10.0, 5.0));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
meta:
  name: small
sim:
  ticks: 10
  seed: 7
swarm:
  vehicle_count: 5
"#;
        let config = ScenarioConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.meta.name, "small");
        assert_eq!(config.sim.ticks, 10);
        assert_eq!(config.sim.progress_every, 24);
        assert_eq!(config.swarm.vehicle_count, 5);
        assert_eq!(config.swarm.seek_speed, 0.5);
        assert_eq!(config.uav.fish_finder.scan_interval_s, 5.0);
    }

    #[test]
    fn test_validation_errors() {
        let yaml = "sim:\n  ticks: 0\n";
        assert!(matches!(
            ScenarioConfig::from_yaml_str(yaml),
            Err(ScenarioError::ValidationError(_))
        ));

        let yaml = "swarm:\n  charging_station: { x: 20.0, y: 0.0, z: 0.0 }\n";
        assert!(matches!(
            ScenarioConfig::from_yaml_str(yaml),
            Err(ScenarioError::ValidationError(_))
        ));

        let yaml = "tank:\n  z_max_m: 0.0\n";
        assert!(matches!(
            ScenarioConfig::from_yaml_str(yaml),
            Err(ScenarioError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            ScenarioConfig::from_yaml_str("sim: [unclosed"),
            Err(ScenarioError::ParseError(_, _))
        ));
    }

    #[test]
    fn test_bundled_scenarios_load() {
        for path in [
            "scenarios/tank_patrol.yaml",
            "scenarios/low_battery.yaml",
            "scenarios/crowded_tank.yaml",
        ] {
            let config = ScenarioConfig::from_file(path).unwrap();
            assert!(config.sim.ticks > 0, "{}", path);
        }
        let low = ScenarioConfig::from_file("scenarios/low_battery.yaml").unwrap();
        assert!(!low.uav.enabled);
        assert_eq!(low.swarm.battery_drain_per_tick, 0.02);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ScenarioConfig::from_file("scenarios/does_not_exist.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
