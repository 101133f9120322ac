// ==========================================
// 多租户餐厅预订系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod reservation;
pub mod settings;
pub mod table;
pub mod tenant;
pub mod types;

// 重导出核心类型
pub use reservation::{Reservation, ReservationQuery};
pub use settings::{ReservationSettings, ServiceHours, Shift};
pub use table::DiningTable;
pub use tenant::Tenant;
pub use types::{ReservationAction, ReservationChannel, ReservationStatus, TableStatus};
