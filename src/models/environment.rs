use crate::models::common::math_utils;
use crate::scenario::{DriftConfig, EnvironmentConfig};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

/// 水質
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaterQuality {
    /// 水温（℃）
    pub temperature: f64,
    pub ph: f64,
    /// 溶存酸素（mg/L）
    pub oxygen: f64,
    /// 塩分（ppt）
    pub salinity: f64,
    /// 濁度（NTU）
    pub turbidity: f64,
}

/// 水槽環境
///
/// 各水質項目が正規分布のランダムウォークで変動し、設定範囲内にクリップされます。
/// 濁度は水槽内では変動させません。
#[derive(Debug, Clone)]
pub struct Environment {
    water_quality: WaterQuality,
    config: EnvironmentConfig,
}

impl Environment {
    pub fn new(config: EnvironmentConfig) -> Self {
        Self {
            water_quality: WaterQuality {
                temperature: config.temperature.initial,
                ph: config.ph.initial,
                oxygen: config.oxygen.initial,
                salinity: config.salinity.initial,
                turbidity: 1.0,
            },
            config,
        }
    }

    /// 環境条件を1ステップ更新
    pub fn update_conditions(&mut self, rng: &mut ChaCha8Rng) {
        let wq = &mut self.water_quality;
        wq.ph = drift(wq.ph, &self.config.ph, rng);
        wq.oxygen = drift(wq.oxygen, &self.config.oxygen, rng);
        wq.salinity = drift(wq.salinity, &self.config.salinity, rng);
        wq.temperature = drift(wq.temperature, &self.config.temperature, rng);
    }

    pub fn temperature(&self) -> f64 {
        self.water_quality.temperature
    }

    pub fn ph(&self) -> f64 {
        self.water_quality.ph
    }

    pub fn oxygen(&self) -> f64 {
        self.water_quality.oxygen
    }

    pub fn salinity(&self) -> f64 {
        self.water_quality.salinity
    }

    /// 現在の水質スナップショット
    pub fn statistics(&self) -> WaterQuality {
        self.water_quality
    }
}

fn drift(value: f64, config: &DriftConfig, rng: &mut ChaCha8Rng) -> f64 {
    let noise: f64 = rng.sample(StandardNormal);
    math_utils::clip(value + noise * config.std_dev, config.min, config.max)
}
