// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 時刻源
pub mod clock;

// 水槽内モデル
pub mod vehicle;
pub mod swarm;
pub mod fish;
pub mod environment;

// 屋外モデル
pub mod geofence;
pub mod fish_finder;
pub mod uav;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use clock::{Clock, SystemClock, ManualClock};
pub use vehicle::{Vehicle, VehicleId, SensorSuite, Mission};
pub use swarm::{Swarm, SwarmError, SwarmStats, Observation};
pub use fish::{Fish, FishSchool, Species, TankFish};
pub use environment::{Environment, WaterQuality};
pub use geofence::GeoFence;
pub use fish_finder::FishFinder;
pub use uav::{UavSimulator, UavStatus};
