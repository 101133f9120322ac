// ==========================================
// 多租户餐厅预订系统 - 引擎层错误类型
// ==========================================
// 职责: 定义面向调用方的错误类型, 区分校验失败与记录缺失
// 约束: 校验失败不产生任何持久化变更
// ==========================================

use crate::domain::types::{ReservationAction, ReservationStatus};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 校验错误 (同步返回调用方) =====
    #[error("无效输入: {0}")]
    Validation(String),

    /// 可用性检查拒绝 (携带首个阻断原因)
    #[error("时段不可预订: {0}")]
    SlotUnavailable(String),

    /// 状态转换表之外的 (状态, 动作) 组合
    #[error("无效的状态转换: status={from} action={action}")]
    InvalidStateTransition {
        from: ReservationStatus,
        action: ReservationAction,
    },

    // ===== 记录缺失 (与校验错误区分) =====
    #[error("资源未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    // ===== 数据访问错误 =====
    #[error("数据访问失败: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 仓储层的记录缺失保持"未找到"语义
            RepositoryError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Repository(other),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
