// ==========================================
// 三战同盟助手 - 领域类型定义
// ==========================================
// 职责: 对比指标枚举与迁城推荐结果类型
// ==========================================

use crate::domain::coord::HexCoord;
use crate::domain::member::MemberSnapshotRow;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Metric - 对比指标
// ==========================================

/// 同盟数据对比支持的指标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Metric {
    Battle,  // 战功总量
    Power,   // 势力值
    Contrib, // 贡献总量
}

impl Metric {
    /// 指标的中文展示名（与导出 CSV 列名一致）
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Battle => "战功总量",
            Metric::Power => "势力值",
            Metric::Contrib => "贡献总量",
        }
    }

    /// 从上传明细行中抽取该指标的取值
    pub fn extract(&self, row: &MemberSnapshotRow) -> i64 {
        match self {
            Metric::Battle => row.battle_total,
            Metric::Power => row.power_value,
            Metric::Contrib => row.contrib_total,
        }
    }

    /// 按外部指令关键字解析指标
    ///
    /// # 返回
    /// - Some(Metric): 可识别的指标关键字
    /// - None: 无法识别
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "battle" | "战功" => Some(Metric::Battle),
            "power" | "势力" => Some(Metric::Power),
            "contrib" | "贡献" => Some(Metric::Contrib),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ==========================================
// RelocationCandidate - 迁城候选点
// ==========================================

/// 单个迁城候选坐标及其评分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationCandidate {
    pub coord: HexCoord,
    /// 到目标坐标的六边形距离
    pub distance_to_target: i64,
    /// 半径 near_radius（默认 5）内目标等级资源点数量
    pub near_count: usize,
    /// (near_radius, cluster_radius]（默认 (5, 20]）内目标等级资源点数量
    pub far_count: usize,
    /// 到最近同郡资源点的距离
    pub same_prefecture_distance: i64,
}

// ==========================================
// NeighborPoint - 推荐点周边资源
// ==========================================

/// 推荐坐标周边的目标等级资源点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborPoint {
    pub coord: HexCoord,
    pub distance: i64,
}

// ==========================================
// RelocationRecommendation - 迁城推荐结果
// ==========================================

/// 迁城测算的最终推荐
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationRecommendation {
    /// 目标坐标归属的郡（最近资源点投票）
    pub prefecture: String,
    pub target: HexCoord,
    /// 最优候选点
    pub best: RelocationCandidate,
    /// 最优点 cluster_radius 内的目标等级资源点（距离升序）
    pub neighbors: Vec<NeighborPoint>,
    /// 备选推荐（最多 runner_up_count 个）
    pub runner_ups: Vec<RelocationCandidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_labels() {
        assert_eq!(Metric::Battle.label(), "战功总量");
        assert_eq!(Metric::Power.label(), "势力值");
        assert_eq!(Metric::Contrib.label(), "贡献总量");
    }

    #[test]
    fn test_metric_from_key() {
        assert_eq!(Metric::from_key("battle"), Some(Metric::Battle));
        assert_eq!(Metric::from_key("势力"), Some(Metric::Power));
        assert_eq!(Metric::from_key("CONTRIB"), Some(Metric::Contrib));
        assert_eq!(Metric::from_key("unknown"), None);
    }

    #[test]
    fn test_metric_extract() {
        let row = MemberSnapshotRow {
            member_name: "张三".to_string(),
            contrib_rank: Some(1),
            contrib_total: 30,
            battle_total: 10,
            assist_total: 5,
            donate_total: 7,
            power_value: 20,
            group_name: "一队".to_string(),
        };
        assert_eq!(Metric::Battle.extract(&row), 10);
        assert_eq!(Metric::Power.extract(&row), 20);
        assert_eq!(Metric::Contrib.extract(&row), 30);
    }
}
