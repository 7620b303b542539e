// ==========================================
// 三战同盟助手 - API 层
// ==========================================
// 职责: 面向聊天入口的业务接口与错误转换
// ==========================================

pub mod analysis_api;
pub mod error;
pub mod map_api;
pub mod messenger;

pub use analysis_api::AnalysisApi;
pub use error::{ApiError, ApiResult};
pub use map_api::{format_radar_report, format_recommendation, RadarApi, RelocationApi};
pub use messenger::{Messenger, NoOpMessenger};
