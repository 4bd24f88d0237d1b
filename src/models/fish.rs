use crate::models::common::{GeoPoint, Position3D, TankBounds};
use crate::scenario::FishSchoolConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

/// 魚種
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Species {
    Bass,
    Trout,
    Salmon,
    Tilapia,
}

impl Species {
    pub const ALL: [Species; 4] = [Species::Bass, Species::Trout, Species::Salmon, Species::Tilapia];
}

/// 屋外の魚（緯度経度座標）
#[derive(Debug, Clone, Serialize)]
pub struct Fish {
    pub id: String,
    pub position: GeoPoint,
    pub species: Species,
    /// 体長（m）
    pub size_m: f64,
    pub last_seen: DateTime<Utc>,
}

/// 水槽内の魚
#[derive(Debug, Clone, Serialize)]
pub struct TankFish {
    pub id: String,
    pub position: Position3D,
}

/// 水槽内の魚群
///
/// 各魚は毎ティック正規分布のランダムウォークで移動し、水槽内に留まります。
/// スウォームへ渡す位置リストとIDリストは常に同じ順序で揃えて返します。
#[derive(Debug, Clone)]
pub struct FishSchool {
    fish: Vec<TankFish>,
    bounds: TankBounds,
    step_std_dev: f64,
}

impl FishSchool {
    pub fn new(config: &FishSchoolConfig, bounds: TankBounds, rng: &mut ChaCha8Rng) -> Self {
        let fish = (0..config.count)
            .map(|i| TankFish {
                id: format!("fish_{}", i),
                position: Position3D::new(
                    rng.r#gen::<f64>() * bounds.x_max_m,
                    rng.r#gen::<f64>() * bounds.y_max_m,
                    rng.r#gen::<f64>() * bounds.z_max_m,
                ),
            })
            .collect();

        Self {
            fish,
            bounds,
            step_std_dev: config.step_std_dev,
        }
    }

    pub fn fish(&self) -> &[TankFish] {
        &self.fish
    }

    /// 全ての魚を1ステップ移動
    pub fn swim(&mut self, rng: &mut ChaCha8Rng) {
        for fish in &mut self.fish {
            let p = &mut fish.position;
            p.x = (p.x + rng.sample::<f64, _>(StandardNormal) * self.step_std_dev).clamp(0.0, self.bounds.x_max_m);
            p.y = (p.y + rng.sample::<f64, _>(StandardNormal) * self.step_std_dev).clamp(0.0, self.bounds.y_max_m);
            p.z = (p.z + rng.sample::<f64, _>(StandardNormal) * self.step_std_dev).clamp(0.0, self.bounds.z_max_m);
        }
    }

    pub fn positions(&self) -> Vec<Position3D> {
        self.fish.iter().map(|f| f.position).collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.fish.iter().map(|f| f.id.clone()).collect()
    }
}
