// ==========================================
// 三战同盟助手 - 同盟成员实体
// ==========================================
// 职责: 同盟统计上传的成员明细与对比结果
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 未分组成员的分组占位值
pub const UNGROUPED: &str = "未分组";

// ==========================================
// MemberSnapshotRow - 上传明细行
// ==========================================

/// 一次同盟统计上传中的单个成员明细
///
/// 字段与游戏导出 CSV 的列一一对应；数值列在导入边界
/// 统一截断为整数，核心不再处理浮点。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshotRow {
    pub member_name: String,
    /// 贡献排行，导出文件中可能缺失
    pub contrib_rank: Option<i64>,
    pub contrib_total: i64,
    pub battle_total: i64,
    pub assist_total: i64,
    pub donate_total: i64,
    pub power_value: i64,
    pub group_name: String,
}

// ==========================================
// MemberRecord - 单指标对比输入
// ==========================================

/// 按某一指标抽取后的成员记录（对比引擎的输入）
///
/// group_name 为空白时在构造处落为 "未分组"。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub member_name: String,
    pub metric_value: i64,
    pub group_name: String,
}

impl MemberRecord {
    pub fn new(member_name: impl Into<String>, metric_value: i64, group_name: &str) -> Self {
        let group = group_name.trim();
        Self {
            member_name: member_name.into(),
            metric_value,
            group_name: if group.is_empty() {
                UNGROUPED.to_string()
            } else {
                group.to_string()
            },
        }
    }
}

// ==========================================
// MetricDiffRow - 对比结果行
// ==========================================

/// 两次快照间单个成员的指标差值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDiffRow {
    pub member_name: String,
    pub group_name: String,
    pub metric_delta: i64,
}

// ==========================================
// SnapshotMeta - 上传元信息
// ==========================================

/// 一次上传的元信息（导出时间 + 成员数）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub ts: NaiveDateTime,
    pub member_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_group_falls_to_ungrouped() {
        let record = MemberRecord::new("张三", 100, "  ");
        assert_eq!(record.group_name, UNGROUPED);

        let record = MemberRecord::new("李四", 100, "一队");
        assert_eq!(record.group_name, "一队");
    }
}
