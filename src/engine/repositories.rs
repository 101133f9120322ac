// ==========================================
// 多租户餐厅预订系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合预订引擎所需的所有 Repository
// 目标: 减少引擎构造函数参数数量, 便于统一装配
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ReservationRepository, ReservationSettingsRepository, RepositoryResult, TableRepository,
    TenantRepository,
};

/// 预订引擎仓储集合
///
/// # 包含的仓储
/// - `reservation_repo`: 预订记录
/// - `table_repo`: 餐桌清单
/// - `settings_repo`: 租户预订策略
/// - `tenant_repo`: 租户功能开关
#[derive(Clone)]
pub struct ReservationRepositories {
    /// 预订仓储
    pub reservation_repo: Arc<ReservationRepository>,
    /// 餐桌仓储
    pub table_repo: Arc<TableRepository>,
    /// 预订策略仓储
    pub settings_repo: Arc<ReservationSettingsRepository>,
    /// 租户仓储
    pub tenant_repo: Arc<TenantRepository>,
}

impl ReservationRepositories {
    /// 从数据库路径创建仓储集合 (每个仓储独立连接)
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        Ok(Self {
            reservation_repo: Arc::new(ReservationRepository::new(db_path.to_string())?),
            table_repo: Arc::new(TableRepository::new(db_path.to_string())?),
            settings_repo: Arc::new(ReservationSettingsRepository::new(db_path.to_string())?),
            tenant_repo: Arc::new(TenantRepository::new(db_path.to_string())?),
        })
    }

    /// 从共享连接创建仓储集合 (测试与单文件部署)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            reservation_repo: Arc::new(ReservationRepository::from_connection(Arc::clone(&conn))),
            table_repo: Arc::new(TableRepository::from_connection(Arc::clone(&conn))),
            settings_repo: Arc::new(ReservationSettingsRepository::from_connection(Arc::clone(
                &conn,
            ))),
            tenant_repo: Arc::new(TenantRepository::from_connection(conn)),
        }
    }
}
