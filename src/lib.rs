// ==========================================
// 三战同盟助手 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 聊天机器人后端核心 (资源州找铜 / 同盟数据对比)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态与会话
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::coord::{CubeCoord, HexCoord};
pub use domain::member::{MemberRecord, MemberSnapshotRow, MetricDiffRow, SnapshotMeta};
pub use domain::resource::{RadarEntry, RadarReport, ResourcePoint};
pub use domain::types::{
    Metric, NeighborPoint, RelocationCandidate, RelocationRecommendation,
};

// 引擎
pub use engine::{MetricDiffEngine, RadarEngine, RelocationPlanner};

// API
pub use api::{AnalysisApi, Messenger, RadarApi, RelocationApi};

// 应用
pub use app::{AppState, InteractionStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "三战同盟助手";
