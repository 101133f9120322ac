// ==========================================
// 多租户餐厅预订系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 可用性与预订引擎 (约束检查 / 餐桌分配 / 状态机 / 自治调度任务)
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

// 调度层 - 自治通知任务
pub mod scheduler;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema 引导）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ReservationAction, ReservationChannel, ReservationStatus, TableStatus,
};

// 领域实体
pub use domain::{DiningTable, Reservation, ReservationQuery, ReservationSettings, ServiceHours, Shift, Tenant};

// 引擎
pub use engine::{
    Availability, AvailabilityResolver, CreateReservationRequest, EngineError, EngineResult,
    ReservationLifecycle, ReservationRepositories, SettingsStore, TableAllocator,
    UpdateReservationRequest,
};

// 调度任务
pub use scheduler::{
    ConfirmationJob, JobRunSummary, LogMailSender, MailMessage, MailSender, NoShowJob,
    NotificationScheduler, ReminderJob,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "多租户餐厅预订系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
