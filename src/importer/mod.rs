// ==========================================
// 三战同盟助手 - 导入层
// ==========================================
// 职责: 外部 CSV 数据到类型化行的解析边界
// 红线: 核心引擎不接触未类型化的数据
// ==========================================

pub mod map_file_parser;
pub mod snapshot_parser;

pub use map_file_parser::{parse_maps_dir, MapParseStats};
pub use snapshot_parser::{parse_members_csv, parse_snapshot_timestamp, SnapshotParseError};
