// ==========================================
// 三战同盟助手 - API层错误类型
// ==========================================
// 职责: 按失败类别穷举核心的错误形态，转换下层错误为
//       用户可读的业务错误
// 类别: 校验错误 / 数据缺失 / 计算失败 / 并发冲突
// ==========================================

use crate::domain::coord::CoordParseError;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 校验类错误的消息可原样回给用户；并发冲突是常规流量形态，
/// 不按异常记录日志。
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 校验错误（用户可纠正，提示重试）
    // ==========================================
    #[error("{0}")]
    InvalidCoordinate(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 数据缺失错误（提示先完成配置/同步）
    // ==========================================
    #[error("赛季「{scenario}」还没有资源数据，请先同步地图资源")]
    ScenarioUnavailable { scenario: String },

    #[error("还没有选择赛季，请先发起找铜并选择赛季")]
    SeasonNotConfigured,

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 计算失败错误（记录完整上下文，提示换个坐标）
    // ==========================================
    #[error("测算失败：{0}，换个坐标再试试")]
    ComputationFailed(String),

    // ==========================================
    // 并发冲突（常规流量，不按异常处理）
    // ==========================================
    #[error("上一次测算还在进行中，请稍候再发")]
    ComputationInFlight,

    // ==========================================
    // 快照时间顺序
    // ==========================================
    #[error("无法确定两次快照的时间先后: {0}")]
    ChronologyUndetermined(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否属于用户可纠正的校验错误（计入重试预算）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidCoordinate(_) | ApiError::InvalidInput(_)
        )
    }
}

// ==========================================
// 从下层错误转换
// 目的: 将技术错误转换为用户可读的业务错误
// ==========================================

impl From<CoordParseError> for ApiError {
    fn from(err: CoordParseError) -> Self {
        // 解析错误的消息本身就是面向用户的
        ApiError::InvalidCoordinate(err.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::CoordinateOutOfRange { coord } => ApiError::InvalidCoordinate(format!(
                "坐标超出地图范围（1~1500）：{}",
                coord
            )),
            EngineError::ScenarioEmpty { scenario } => {
                ApiError::ScenarioUnavailable { scenario }
            }
            EngineError::CatalogEmpty => ApiError::ComputationFailed(
                "资源目录为空，无法判定坐标归属的郡".to_string(),
            ),
            EngineError::NoCandidateInRange { target, radius } => ApiError::ComputationFailed(
                format!("目标坐标 {} 周边 {} 格内没有可用的候选点", target, radius),
            ),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("重复数据: {}", msg))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
