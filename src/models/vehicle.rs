use crate::models::{
    common::{Position3D, Velocity3D},
    traits::IAgent,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 無人潜水機（AUV）の識別子
///
/// スウォーム生成時に単調増加で割り当てられ、プロセス生存中は不変です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AUV-{:03}", self.0)
    }
}

/// 搭載センサーの稼働フラグ（情報表示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSuite {
    pub camera: bool,
    pub sonar: bool,
    pub pressure: bool,
    pub magnetic: bool,
}

impl SensorSuite {
    /// 全センサー稼働状態
    pub fn all_active() -> Self {
        Self {
            camera: true,
            sonar: true,
            pressure: true,
            magnetic: true,
        }
    }
}

/// 現在のミッション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mission {
    /// 巡回（初期状態、魚がいない場合）
    Patrol,
    /// 充電ステーションへの帰還・充電中
    Charging,
    /// 最寄りの魚を追跡中
    TrackFish,
    /// 外部から割り当てられた任意ラベル
    Custom(String),
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mission::Patrol => write!(f, "patrol"),
            Mission::Charging => write!(f, "charging"),
            Mission::TrackFish => write!(f, "track_fish"),
            Mission::Custom(label) => write!(f, "{}", label),
        }
    }
}

/// 無人潜水機エージェント
///
/// 位置・速度・バッテリー残量・センサー状態・ミッションを保持します。
/// 状態の更新はすべて [`crate::models::swarm::Swarm`] が行います。
#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub position: Position3D,
    pub velocity: Velocity3D,
    /// バッテリー残量 [0, 1]
    pub battery_level: f64,
    pub sensors: SensorSuite,
    pub mission: Mission,
}

impl Vehicle {
    /// 満充電・静止・巡回ミッションの機体を作成
    pub fn new(id: VehicleId, position: Position3D) -> Self {
        Self {
            id,
            position,
            velocity: Velocity3D::zero(),
            battery_level: 1.0,
            sensors: SensorSuite::all_active(),
            mission: Mission::Patrol,
        }
    }

    /// バッテリーを消費する（0未満にはならない）
    pub fn drain_battery(&mut self, amount: f64) {
        self.battery_level = (self.battery_level - amount).max(0.0);
    }

    /// バッテリーを充電する（1.0で頭打ち）
    pub fn charge_battery(&mut self, amount: f64) {
        self.battery_level = (self.battery_level + amount).min(1.0);
    }

    /// 外部割り当てラベルのミッションかどうか
    pub fn has_custom_mission(&self) -> bool {
        matches!(self.mission, Mission::Custom(_))
    }
}

impl IAgent for Vehicle {
    fn get_id(&self) -> String {
        self.id.to_string()
    }

    fn is_active(&self) -> bool {
        self.battery_level > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vehicle_defaults() {
        let v = Vehicle::new(VehicleId(1), Position3D::new(1.0, 2.0, 3.0));
        assert_eq!(v.get_id(), "AUV-001");
        assert_eq!(v.battery_level, 1.0);
        assert_eq!(v.velocity, Velocity3D::zero());
        assert_eq!(v.mission, Mission::Patrol);
        assert_eq!(v.sensors, SensorSuite::all_active());
    }

    #[test]
    fn test_battery_limits() {
        let mut v = Vehicle::new(VehicleId(0), Position3D::origin());
        v.charge_battery(0.5);
        assert_eq!(v.battery_level, 1.0);
        v.drain_battery(1.5);
        assert_eq!(v.battery_level, 0.0);
        assert!(!v.is_active());
    }

    #[test]
    fn test_mission_display() {
        assert_eq!(Mission::TrackFish.to_string(), "track_fish");
        assert_eq!(Mission::Custom("inspect_net".to_string()).to_string(), "inspect_net");
    }
}
