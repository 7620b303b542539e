// ==========================================
// 三战同盟助手 - 领域层
// ==========================================
// 职责: 实体与值类型定义
// 红线: 领域层不访问数据库，仅含值类型自身的运算
// ==========================================

pub mod coord;
pub mod member;
pub mod resource;
pub mod types;

// 重导出核心类型
pub use coord::{parse_coordinate_text, CoordParseError, CubeCoord, HexCoord};
pub use member::{MemberRecord, MemberSnapshotRow, MetricDiffRow, SnapshotMeta};
pub use resource::{RadarEntry, RadarReport, ResourcePoint};
pub use types::{Metric, NeighborPoint, RelocationCandidate, RelocationRecommendation};
