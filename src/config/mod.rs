// ==========================================
// 三战同盟助手 - 系统配置
// ==========================================
// 职责: 集中定义算法常量与运行参数
// 说明: 搜索半径类常量为经验值，保留为可配置项而非重新推导
// ==========================================

use std::path::PathBuf;

// ==========================================
// PlannerConfig - 迁城测算配置
// ==========================================

/// 迁城测算引擎配置
///
/// 半径类参数均为地图格数（六边形距离）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// 候选点距目标的最大距离
    pub radius_limit: i64,
    /// 资源聚集统计的外圈半径（同时是推荐点邻近资源的枚举半径）
    pub cluster_radius: i64,
    /// 预筛选资源点时在 radius_limit + cluster_radius 之外追加的余量
    ///
    /// 经验值：极端目录下预筛选仍可能过度裁剪，此时回退为全量
    /// 同郡目标等级资源点参与计分（见 RelocationPlanner）。
    pub narrow_slack: i64,
    /// 近圈计数半径（near_count: distance <= near_radius）
    pub near_radius: i64,
    /// 目标资源等级前缀（如 "8" 表示 8 级资源）
    pub tier_prefix: &'static str,
    /// 目标资源类型标记（如 "铜"）
    pub tier_marker: &'static str,
    /// 返回的备选推荐数量（最优点之外）
    pub runner_up_count: usize,
}

impl PlannerConfig {
    /// 预筛选半径 = radius_limit + cluster_radius + narrow_slack
    pub fn narrow_radius(&self) -> i64 {
        self.radius_limit + self.cluster_radius + self.narrow_slack
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            radius_limit: 100,
            cluster_radius: 20,
            narrow_slack: 20,
            near_radius: 5,
            tier_prefix: "8",
            tier_marker: "铜",
            runner_up_count: 2,
        }
    }
}

// ==========================================
// RadarConfig - 周边资源查询配置
// ==========================================

/// 周边资源查询（雷达）配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadarConfig {
    /// 返回的最近资源点数量上限
    pub top_k: usize,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

// ==========================================
// 会话交互限制
// ==========================================

/// 坐标输入的重试上限：连续输错达到该次数后取消本次交互
pub const MAX_COORD_ATTEMPTS: u8 = 3;

// ==========================================
// 坐标有效范围
// ==========================================

/// 游戏坐标最小值（含）
pub const COORD_MIN: i32 = 1;

/// 游戏坐标最大值（含）
pub const COORD_MAX: i32 = 1500;

// ==========================================
// 默认数据库路径
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 SANBOT_DB_PATH 指定的路径（优先）
/// - 否则为用户数据目录下 sanbot/sanbot.db
/// - 无法获取用户数据目录时回退为 ./sanbot.db
pub fn get_default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("SANBOT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./sanbot.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("sanbot");
        // 确保目录存在
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("sanbot.db");
    }

    path.to_string_lossy().to_string()
}
