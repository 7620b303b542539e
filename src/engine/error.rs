// ==========================================
// 三战同盟助手 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::coord::HexCoord;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 目标坐标超出地图范围（计算开始前拒绝）
    #[error("坐标超出地图范围（1~1500）：{coord}")]
    CoordinateOutOfRange { coord: HexCoord },

    /// 赛季没有任何资源点
    #[error("赛季「{scenario}」暂无资源数据")]
    ScenarioEmpty { scenario: String },

    /// 资源目录为空，无法做最近点投票
    #[error("资源目录为空，无法判定坐标归属的郡")]
    CatalogEmpty,

    /// 筛选后没有剩余候选点
    #[error("目标坐标 {target} 周边 {radius} 格内没有可用的候选点")]
    NoCandidateInRange { target: HexCoord, radius: i64 },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
