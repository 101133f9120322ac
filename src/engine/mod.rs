// ==========================================
// 多租户餐厅预订系统 - 引擎层
// ==========================================
// 职责: 业务规则 (可用性判定/餐桌分配/生命周期状态机/策略存取)
// 红线: 引擎通过 Repository 访问数据, 不直接写 SQL
// ==========================================

pub mod allocator;
pub mod availability;
pub mod error;
pub mod lifecycle;
pub mod repositories;
pub mod settings_store;

// 重导出核心类型
pub use allocator::TableAllocator;
pub use availability::{
    Availability, AvailabilityCore, AvailabilityResolver, ALTERNATIVE_OFFSETS_MINUTES,
    MAX_ALTERNATIVES,
};
pub use error::{EngineError, EngineResult};
pub use lifecycle::{
    next_status, CreateReservationRequest, ReservationLifecycle, UpdateReservationRequest,
    DEFAULT_DURATION_MINUTES,
};
pub use repositories::ReservationRepositories;
pub use settings_store::SettingsStore;
