// ==========================================
// 三战同盟助手 - 应用层
// ==========================================
// 职责: 应用状态装配与用户会话管理
// ==========================================

pub mod session;
pub mod state;

pub use session::{InteractionStore, RetryOutcome, SessionError};
pub use state::AppState;
