// ==========================================
// 多租户餐厅预订系统 - 餐桌数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 管理 dining_table 表的CRUD与容量查询
// ==========================================

use crate::domain::table::DiningTable;
use crate::domain::types::TableStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_enum_column, parse_opt_datetime_column, DATETIME_FMT};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// dining_table 表的全列清单 (SELECT 共用)
const TABLE_COLUMNS: &str = r#"
    id, tenant_id, table_number, section,
    min_capacity, max_capacity, status, is_active,
    guest_count, seated_at
"#;

// ==========================================
// TableRepository - 餐桌仓储
// ==========================================

/// 餐桌仓储
pub struct TableRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TableRepository {
    /// 创建新的餐桌仓储实例
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

    /// 行 → 领域实体
    fn map_row(row: &Row<'_>) -> rusqlite::Result<DiningTable> {
        Ok(DiningTable {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            table_number: row.get(2)?,
            section: row.get(3)?,
            min_capacity: row.get(4)?,
            max_capacity: row.get(5)?,
            status: parse_enum_column(6, &row.get::<_, String>(6)?, TableStatus::from_str)?,
            is_active: row.get(7)?,
            guest_count: row.get(8)?,
            seated_at: parse_opt_datetime_column(9, row.get(9)?)?,
        })
    }

    /// 写入一张餐桌
    pub fn insert(&self, table: &DiningTable) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO dining_table (
                id, tenant_id, table_number, section,
                min_capacity, max_capacity, status, is_active,
                guest_count, seated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                table.id,
                table.tenant_id,
                table.table_number,
                table.section,
                table.min_capacity,
                table.max_capacity,
                table.status.as_str(),
                table.is_active,
                table.guest_count,
                table
                    .seated_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询 (租户隔离)
    pub fn find_by_id(&self, tenant_id: &str, id: &str) -> RepositoryResult<Option<DiningTable>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM dining_table WHERE id = ?1 AND tenant_id = ?2",
            TABLE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let table = stmt
            .query_row(params![id, tenant_id], Self::map_row)
            .optional()?;
        Ok(table)
    }

    /// 最优匹配查询: 容量覆盖人数且空闲, 取最大容量最小者
    ///
    /// # 规则
    /// - min_capacity ≤ party_size ≤ max_capacity
    /// - status = available, is_active = 1
    /// - ORDER BY max_capacity ASC (紧致优先), table_number 兜底保证确定性
    pub fn find_best_fit(
        &self,
        tenant_id: &str,
        party_size: i32,
    ) -> RepositoryResult<Option<DiningTable>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM dining_table
            WHERE tenant_id = ?1
              AND is_active = 1
              AND status = 'available'
              AND min_capacity <= ?2
              AND max_capacity >= ?2
            ORDER BY max_capacity ASC, table_number ASC
            LIMIT 1
            "#,
            TABLE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let table = stmt
            .query_row(params![tenant_id, party_size], Self::map_row)
            .optional()?;
        Ok(table)
    }

    /// 统计容量覆盖指定人数的活跃餐桌数
    ///
    /// # 说明
    /// - 仅按容量存在性统计, 不过滤餐桌状态 (与时段占用检查分离)
    pub fn count_with_capacity(
        &self,
        tenant_id: &str,
        party_size: i32,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM dining_table
            WHERE tenant_id = ?1
              AND is_active = 1
              AND max_capacity >= ?2
            "#,
            params![tenant_id, party_size],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 更新餐桌状态
    pub fn set_status(
        &self,
        tenant_id: &str,
        id: &str,
        status: TableStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE dining_table SET status = ?3 WHERE id = ?1 AND tenant_id = ?2",
            params![id, tenant_id, status.as_str()],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "DiningTable".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 入座: 状态置 occupied 并记录人数与入座时间
    pub fn mark_occupied(
        &self,
        tenant_id: &str,
        id: &str,
        guest_count: i32,
        seated_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE dining_table
            SET status = 'occupied', guest_count = ?3, seated_at = ?4
            WHERE id = ?1 AND tenant_id = ?2
            "#,
            params![
                id,
                tenant_id,
                guest_count,
                seated_at.format(DATETIME_FMT).to_string()
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "DiningTable".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 释放: 状态回 available, 清空入座信息
    pub fn release(&self, tenant_id: &str, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE dining_table
            SET status = 'available', guest_count = NULL, seated_at = NULL
            WHERE id = ?1 AND tenant_id = ?2
            "#,
            params![id, tenant_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "DiningTable".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
