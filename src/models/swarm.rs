//! # Swarm モジュール
//!
//! 水槽内を巡回する無人潜水機（AUV）群の運動モデルを提供します。
//!
//! 1ティックごとに全機体の状態を更新します。各機体は以下の順で処理されます：
//!
//! 1. **低バッテリー判定**: 残量が閾値未満なら充電ステーションへ帰還（以降の処理は行わない）
//! 2. **最寄りの魚の探索**: 魚がいなければ正規分布のランダム速度
//! 3. **速度合成**: 魚への追従速度と近傍機体からの反発速度の重み付き和
//! 4. **位置更新**: `position += velocity`
//! 5. **バッテリー消費**
//! 6. **境界反射**: 軸ごとにクランプし、速度成分を反転・減衰
//!
//! 反発速度の計算はティック開始時点の位置スナップショットを参照するため、
//! 機体の処理順序は結果に影響しません。

use crate::models::{
    clock::{Clock, SystemClock},
    common::{Position3D, TankBounds, Velocity3D},
    vehicle::{Mission, SensorSuite, Vehicle, VehicleId},
};
use crate::scenario::SwarmConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// スウォーム操作のエラー
#[derive(Debug, Error, PartialEq)]
pub enum SwarmError {
    /// 位置リストとIDリストの長さが一致しない
    #[error("入力リストの長さが一致しません: 位置 {positions} 件, ID {ids} 件")]
    MisalignedInput { positions: usize, ids: usize },
    /// 存在しない機体ID
    #[error("機体が見つかりません: {0}")]
    UnknownVehicle(VehicleId),
}

/// 魚の観測記録
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    /// 観測時の魚の位置
    pub position: Position3D,
    pub timestamp: DateTime<Utc>,
    /// 観測した機体
    pub vehicle_id: VehicleId,
    /// 観測時の機体のセンサー状態
    pub sensors: SensorSuite,
}

/// スウォーム統計情報
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwarmStats {
    /// バッテリー残量が閾値を超える機体数
    pub active_vehicles: usize,
    /// 平均バッテリー残量（機体が0の場合は0.0）
    pub average_battery: f64,
    /// 1回以上観測された魚の数
    pub tracked_fish: usize,
    /// 総観測数
    pub total_observations: usize,
}

/// AUVスウォーム
///
/// 固定数の機体を排他的に所有します。内部にロックは持たないため、
/// 複数の呼び出し元から共有する場合は外部で排他制御してください。
pub struct Swarm {
    vehicles: Vec<Vehicle>,
    tracking_data: BTreeMap<String, Vec<Observation>>,
    bounds: TankBounds,
    config: SwarmConfig,
    rng: ChaCha8Rng,
    clock: Arc<dyn Clock>,
}

impl Swarm {
    /// 新しいスウォームを作成
    ///
    /// 各機体は境界ボックス内の一様乱数位置、速度ゼロ、満充電、
    /// 全センサー稼働、巡回ミッションで生成されます。
    ///
    /// # 引数
    ///
    /// * `vehicle_count` - 機体数（0も可）
    /// * `bounds` - 水槽の境界ボックス
    /// * `config` - 運動パラメータ
    /// * `rng` - 乱数生成器（初期位置とランダム移動に使用）
    pub fn new(vehicle_count: usize, bounds: TankBounds, config: SwarmConfig, mut rng: ChaCha8Rng) -> Self {
        let vehicles = (0..vehicle_count)
            .map(|i| {
                let position = Position3D::new(
                    rng.r#gen::<f64>() * bounds.x_max_m,
                    rng.r#gen::<f64>() * bounds.y_max_m,
                    rng.r#gen::<f64>() * bounds.z_max_m,
                );
                Vehicle::new(VehicleId(i as u32 + 1), position)
            })
            .collect();

        Self {
            vehicles,
            tracking_data: BTreeMap::new(),
            bounds,
            config,
            rng,
            clock: Arc::new(SystemClock),
        }
    }

    /// 時刻源を差し替える
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn bounds(&self) -> TankBounds {
        self.bounds
    }

    /// 特定の魚の観測記録
    pub fn observations(&self, target_id: &str) -> &[Observation] {
        self.tracking_data.get(target_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 外部からミッションを割り当てる
    pub fn assign_mission(&mut self, id: VehicleId, mission: Mission) -> Result<(), SwarmError> {
        let vehicle = self.vehicle_mut(id).ok_or(SwarmError::UnknownVehicle(id))?;
        debug!("ミッション割り当て: {} -> {}", vehicle.id, mission);
        vehicle.mission = mission;
        Ok(())
    }

    /// 全機体を1ティック進める
    ///
    /// # 引数
    ///
    /// * `target_positions` - このティックの魚の位置リスト
    pub fn advance(&mut self, target_positions: &[Position3D]) {
        let snapshot: Vec<(VehicleId, Position3D)> =
            self.vehicles.iter().map(|v| (v.id, v.position)).collect();
        let config = &self.config;

        for vehicle in &mut self.vehicles {
            if vehicle.battery_level < config.low_battery_threshold {
                return_to_charge(vehicle, config);
                continue;
            }

            if !vehicle.has_custom_mission() {
                vehicle.mission = if target_positions.is_empty() {
                    Mission::Patrol
                } else {
                    Mission::TrackFish
                };
            }

            vehicle.velocity = match nearest_target(&vehicle.position, target_positions) {
                None => jitter(&mut self.rng, config.jitter_std_dev),
                Some(target) => {
                    let seek = vehicle.position.direction_to(target) * config.seek_speed;
                    let repulsion = repulsion(vehicle.id, &vehicle.position, &snapshot, config.separation_radius_m);
                    seek * config.seek_weight + repulsion * config.repulsion_weight
                }
            };

            vehicle.position += vehicle.velocity;
            vehicle.drain_battery(config.battery_drain_per_tick);

            if self.bounds.reflect(&mut vehicle.position, &mut vehicle.velocity, config.wall_restitution) {
                trace!("壁面反射: {} ({:.2}, {:.2}, {:.2})",
                       vehicle.id, vehicle.position.x, vehicle.position.y, vehicle.position.z);
            }
        }
    }

    /// 魚の観測記録
    ///
    /// 各魚について全機体から最寄りの機体を求め、その距離が観測半径未満の場合のみ
    /// 観測を追記します。
    ///
    /// # 戻り値
    ///
    /// このティックで追記された観測数。長さ不一致の場合は何も記録せずエラー。
    pub fn record_observations<S: AsRef<str>>(
        &mut self,
        target_positions: &[Position3D],
        target_ids: &[S],
    ) -> Result<usize, SwarmError> {
        if target_positions.len() != target_ids.len() {
            return Err(SwarmError::MisalignedInput {
                positions: target_positions.len(),
                ids: target_ids.len(),
            });
        }

        let timestamp = self.clock.now();
        let mut recorded = 0;

        for (position, id) in target_positions.iter().zip(target_ids) {
            let Some((vehicle, distance)) = nearest_vehicle(&self.vehicles, position) else {
                continue;
            };
            if distance < self.config.observation_radius_m {
                self.tracking_data
                    .entry(id.as_ref().to_string())
                    .or_default()
                    .push(Observation {
                        position: *position,
                        timestamp,
                        vehicle_id: vehicle.id,
                        sensors: vehicle.sensors,
                    });
                recorded += 1;
            }
        }

        Ok(recorded)
    }

    /// 統計情報の取得
    pub fn statistics(&self) -> SwarmStats {
        let active_vehicles = self
            .vehicles
            .iter()
            .filter(|v| v.battery_level > self.config.low_battery_threshold)
            .count();
        let average_battery = if self.vehicles.is_empty() {
            0.0
        } else {
            self.vehicles.iter().map(|v| v.battery_level).sum::<f64>() / self.vehicles.len() as f64
        };

        SwarmStats {
            active_vehicles,
            average_battery,
            tracked_fish: self.tracking_data.values().filter(|log| !log.is_empty()).count(),
            total_observations: self.tracking_data.values().map(Vec::len).sum(),
        }
    }
}

/// 充電ステーションへの帰還処理
///
/// ドッキング半径外なら帰還速度で直進（ステーションを越えないよう移動量を制限）、
/// 半径内なら充電のみ行い移動しない。
fn return_to_charge(vehicle: &mut Vehicle, config: &SwarmConfig) {
    if vehicle.mission != Mission::Charging {
        debug!("低バッテリー帰還開始: {} (残量: {:.3})", vehicle.id, vehicle.battery_level);
        vehicle.mission = Mission::Charging;
    }

    let station = config.charging_station;
    let distance = vehicle.position.distance_3d(&station);

    if distance > config.docking_radius_m {
        let step = config.return_speed.min(distance);
        vehicle.velocity = vehicle.position.direction_to(&station) * step;
        vehicle.position += vehicle.velocity;
    } else {
        vehicle.velocity = Velocity3D::zero();
        vehicle.charge_battery(config.charge_per_tick);
        trace!("充電中: {} (残量: {:.3})", vehicle.id, vehicle.battery_level);
    }
}

/// 最寄りの魚（距離が同じ場合は先に現れたもの）
fn nearest_target<'a>(position: &Position3D, targets: &'a [Position3D]) -> Option<&'a Position3D> {
    targets
        .iter()
        .map(|t| (t, position.distance_3d(t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(t, _)| t)
}

/// 最寄りの機体とその距離（距離が同じ場合は先に現れたもの）
fn nearest_vehicle<'a>(vehicles: &'a [Vehicle], position: &Position3D) -> Option<(&'a Vehicle, f64)> {
    vehicles
        .iter()
        .map(|v| (v, v.position.distance_3d(position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// 近傍機体からの反発速度: Σ (p − q) / |p − q|²
///
/// 距離が `radius` 以上の機体と、完全に重なった機体は寄与しない。
fn repulsion(id: VehicleId, position: &Position3D, snapshot: &[(VehicleId, Position3D)], radius: f64) -> Velocity3D {
    let mut total = Velocity3D::zero();
    for (other_id, other_position) in snapshot {
        if *other_id == id {
            continue;
        }
        let distance = position.distance_3d(other_position);
        if distance > 0.0 && distance < radius {
            total += position.offset_from(other_position) * (1.0 / distance.powi(2));
        }
    }
    total
}

/// 各成分 N(0, std_dev) のランダム速度
fn jitter(rng: &mut ChaCha8Rng, std_dev: f64) -> Velocity3D {
    Velocity3D::new(
        rng.sample::<f64, _>(StandardNormal) * std_dev,
        rng.sample::<f64, _>(StandardNormal) * std_dev,
        rng.sample::<f64, _>(StandardNormal) * std_dev,
    )
}
