/// 全てのシミュレーションエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// エージェントがアクティブかどうか
    fn is_active(&self) -> bool;
}

/// 探知センサーのインターフェース
pub trait ISensor {
    /// 探知範囲（m）の取得
    fn get_detection_range(&self) -> f64;

    /// 現在探知可能かどうか
    fn is_ready(&self) -> bool;
}
