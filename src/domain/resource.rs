// ==========================================
// 三战同盟助手 - 地图资源实体
// ==========================================
// 职责: 资源点目录与周边资源查询结果
// 生命周期: 资源点由外部同步进程全量覆盖导入，查询期间只读
// ==========================================

use crate::domain::coord::HexCoord;
use serde::{Deserialize, Serialize};

// ==========================================
// ResourcePoint - 地图资源点
// ==========================================

/// 单个地图资源点
///
/// 每个资源点属于且仅属于一个赛季数据集（scenario），
/// resource_level 为自由文本等级标签（如 "8铜"、"9铜"、"10铜"）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePoint {
    pub scenario: String,
    pub prefecture: String,
    pub resource_level: String,
    pub coord: HexCoord,
}

impl ResourcePoint {
    pub fn new(
        scenario: impl Into<String>,
        prefecture: impl Into<String>,
        resource_level: impl Into<String>,
        coord: HexCoord,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            prefecture: prefecture.into(),
            resource_level: resource_level.into(),
            coord,
        }
    }
}

// ==========================================
// RadarEntry / RadarReport - 周边资源查询结果
// ==========================================

/// 周边资源查询的单条结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarEntry {
    pub prefecture: String,
    pub resource_level: String,
    pub coord: HexCoord,
    pub distance: i64,
}

/// 周边资源查询结果（按距离升序，最多 top_k 条）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarReport {
    pub scenario: String,
    pub target: HexCoord,
    pub entries: Vec<RadarEntry>,
}
