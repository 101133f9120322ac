// ==========================================
// 多租户餐厅预订系统 - 租户数据仓储
// ==========================================
// 职责: 调度任务的租户枚举与功能开关读取
// ==========================================

use crate::domain::tenant::Tenant;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// TenantRepository - 租户仓储
// ==========================================

/// 租户仓储
pub struct TenantRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TenantRepository {
    /// 创建新的租户仓储实例
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(&db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Tenant> {
        Ok(Tenant {
            id: row.get(0)?,
            name: row.get(1)?,
            reservations_enabled: row.get(2)?,
            is_active: row.get(3)?,
        })
    }

    /// 写入一个租户
    pub fn insert(&self, tenant: &Tenant) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO tenant (id, name, reservations_enabled, is_active)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                tenant.id,
                tenant.name,
                tenant.reservations_enabled,
                tenant.is_active
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Tenant>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, reservations_enabled, is_active FROM tenant WHERE id = ?1",
        )?;
        let tenant = stmt.query_row(params![id], Self::map_row).optional()?;
        Ok(tenant)
    }

    /// 枚举开通预订模块的活跃租户 (调度任务入口查询)
    pub fn list_with_reservations_enabled(&self) -> RepositoryResult<Vec<Tenant>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, reservations_enabled, is_active
            FROM tenant
            WHERE is_active = 1 AND reservations_enabled = 1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map([], Self::map_row)?;
        let mut tenants = Vec::new();
        for row in rows {
            tenants.push(row?);
        }
        Ok(tenants)
    }
}
