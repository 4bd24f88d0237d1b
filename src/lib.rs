//! # aquasim
//!
//! 深海養殖タンクのロボット監視シミュレーション。
//!
//! - [`models`]: AUVスウォーム、魚群、水質、ジオフェンス、魚群探知機、UAV
//! - [`scenario`]: YAMLシナリオ設定
//! - [`simulation`]: ティック駆動の実行エンジンとレポート
//! - [`logging`]: tracingによるログ出力設定

pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
