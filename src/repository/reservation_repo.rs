// ==========================================
// 多租户餐厅预订系统 - 预订数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 管理 reservation 表的CRUD与调度任务所需的筛选查询
// ==========================================

use crate::domain::reservation::{Reservation, ReservationQuery};
use crate::domain::types::{ReservationChannel, ReservationStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{
    parse_date_column, parse_datetime_column, parse_enum_column, parse_opt_datetime_column,
    parse_time_column, DATETIME_FMT, DATE_FMT, TIME_FMT,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::sync::{Arc, Mutex};

/// reservation 表的全列清单 (SELECT 共用)
const RESERVATION_COLUMNS: &str = r#"
    id, tenant_id, reservation_number, guest_name, guest_phone, guest_email,
    date, time, party_size, duration_minutes,
    table_id, table_number, section,
    status, channel, notes, cancel_reason,
    confirmation_sent_at, reminder_sent_at, seated_at, completed_at, cancelled_at,
    order_id, created_at
"#;

// ==========================================
// ReservationRepository - 预订仓储
// ==========================================

/// 预订仓储
pub struct ReservationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationRepository {
    /// 创建新的预订仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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
    fn map_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
        Ok(Reservation {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            reservation_number: row.get(2)?,
            guest_name: row.get(3)?,
            guest_phone: row.get(4)?,
            guest_email: row.get(5)?,
            date: parse_date_column(6, &row.get::<_, String>(6)?)?,
            time: parse_time_column(7, &row.get::<_, String>(7)?)?,
            party_size: row.get(8)?,
            duration_minutes: row.get(9)?,
            table_id: row.get(10)?,
            table_number: row.get(11)?,
            section: row.get(12)?,
            status: parse_enum_column(
                13,
                &row.get::<_, String>(13)?,
                ReservationStatus::from_str,
            )?,
            channel: parse_enum_column(
                14,
                &row.get::<_, String>(14)?,
                ReservationChannel::from_str,
            )?,
            notes: row.get(15)?,
            cancel_reason: row.get(16)?,
            confirmation_sent_at: parse_opt_datetime_column(17, row.get(17)?)?,
            reminder_sent_at: parse_opt_datetime_column(18, row.get(18)?)?,
            seated_at: parse_opt_datetime_column(19, row.get(19)?)?,
            completed_at: parse_opt_datetime_column(20, row.get(20)?)?,
            cancelled_at: parse_opt_datetime_column(21, row.get(21)?)?,
            order_id: row.get(22)?,
            created_at: parse_datetime_column(23, &row.get::<_, String>(23)?)?,
        })
    }

    /// 写入一条预订
    pub fn insert(&self, reservation: &Reservation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reservation (
                id, tenant_id, reservation_number, guest_name, guest_phone, guest_email,
                date, time, party_size, duration_minutes,
                table_id, table_number, section,
                status, channel, notes, cancel_reason,
                confirmation_sent_at, reminder_sent_at, seated_at, completed_at, cancelled_at,
                order_id, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22,
                ?23, ?24
            )
            "#,
            params![
                reservation.id,
                reservation.tenant_id,
                reservation.reservation_number,
                reservation.guest_name,
                reservation.guest_phone,
                reservation.guest_email,
                reservation.date.format(DATE_FMT).to_string(),
                reservation.time.format(TIME_FMT).to_string(),
                reservation.party_size,
                reservation.duration_minutes,
                reservation.table_id,
                reservation.table_number,
                reservation.section,
                reservation.status.as_str(),
                reservation.channel.as_str(),
                reservation.notes,
                reservation.cancel_reason,
                reservation
                    .confirmation_sent_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .reminder_sent_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .seated_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .completed_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .cancelled_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation.order_id,
                reservation.created_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// 整行更新 (生命周期转换落库)
    pub fn update(&self, reservation: &Reservation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE reservation SET
                guest_name = ?3, guest_phone = ?4, guest_email = ?5,
                date = ?6, time = ?7, party_size = ?8, duration_minutes = ?9,
                table_id = ?10, table_number = ?11, section = ?12,
                status = ?13, channel = ?14, notes = ?15, cancel_reason = ?16,
                confirmation_sent_at = ?17, reminder_sent_at = ?18,
                seated_at = ?19, completed_at = ?20, cancelled_at = ?21,
                order_id = ?22
            WHERE id = ?1 AND tenant_id = ?2
            "#,
            params![
                reservation.id,
                reservation.tenant_id,
                reservation.guest_name,
                reservation.guest_phone,
                reservation.guest_email,
                reservation.date.format(DATE_FMT).to_string(),
                reservation.time.format(TIME_FMT).to_string(),
                reservation.party_size,
                reservation.duration_minutes,
                reservation.table_id,
                reservation.table_number,
                reservation.section,
                reservation.status.as_str(),
                reservation.channel.as_str(),
                reservation.notes,
                reservation.cancel_reason,
                reservation
                    .confirmation_sent_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .reminder_sent_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .seated_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .completed_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation
                    .cancelled_at
                    .map(|t| t.format(DATETIME_FMT).to_string()),
                reservation.order_id,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Reservation".to_string(),
                id: reservation.id.clone(),
            });
        }
        Ok(())
    }

    /// 按ID查询 (租户隔离)
    pub fn find_by_id(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> RepositoryResult<Option<Reservation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM reservation WHERE id = ?1 AND tenant_id = ?2",
            RESERVATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let reservation = stmt
            .query_row(params![id, tenant_id], Self::map_row)
            .optional()?;
        Ok(reservation)
    }

    /// 列表查询 (可选过滤: 日期/日期范围/状态/姓名/电话子串)
    pub fn find_all(
        &self,
        tenant_id: &str,
        query: &ReservationQuery,
    ) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;

        let mut sql = format!(
            "SELECT {} FROM reservation WHERE tenant_id = ?1",
            RESERVATION_COLUMNS
        );
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(tenant_id.to_string())];

        if let Some(date) = query.date {
            values.push(Box::new(date.format(DATE_FMT).to_string()));
            sql.push_str(&format!(" AND date = ?{}", values.len()));
        }
        if let (Some(start), Some(end)) = (query.start, query.end) {
            values.push(Box::new(start.format(DATE_FMT).to_string()));
            sql.push_str(&format!(" AND date >= ?{}", values.len()));
            values.push(Box::new(end.format(DATE_FMT).to_string()));
            sql.push_str(&format!(" AND date <= ?{}", values.len()));
        }
        if let Some(status) = query.status {
            values.push(Box::new(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(name) = &query.guest_name {
            values.push(Box::new(format!("%{}%", name)));
            sql.push_str(&format!(
                " AND guest_name LIKE ?{} COLLATE NOCASE",
                values.len()
            ));
        }
        if let Some(phone) = &query.guest_phone {
            values.push(Box::new(format!("%{}%", phone)));
            sql.push_str(&format!(" AND guest_phone LIKE ?{}", values.len()));
        }
        sql.push_str(" ORDER BY date ASC, time ASC");

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt.query_map(params_ref.as_slice(), Self::map_row)?;
        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?);
        }
        Ok(reservations)
    }

    /// 按月查询活跃预订 (日历视图)
    pub fn find_by_month(
        &self,
        tenant_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM reservation
            WHERE tenant_id = ?1
              AND strftime('%Y-%m', date) = ?2
              AND status IN ('pending', 'confirmed', 'seated')
            ORDER BY date ASC, time ASC
            "#,
            RESERVATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let month_key = format!("{:04}-{:02}", year, month);
        let rows = stmt.query_map(params![tenant_id, month_key], Self::map_row)?;
        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?);
        }
        Ok(reservations)
    }

    /// 统计指定日期、时刻窗口内的活跃预订数
    ///
    /// # 说明
    /// - 活跃态 = pending/confirmed/seated
    /// - 时刻以 %H:%M 字符串存储, 字典序与时间序一致, 可直接 BETWEEN
    pub fn count_active_in_window(
        &self,
        tenant_id: &str,
        date: NaiveDate,
        window_start: NaiveTime,
        window_end: NaiveTime,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM reservation
            WHERE tenant_id = ?1
              AND date = ?2
              AND status IN ('pending', 'confirmed', 'seated')
              AND time >= ?3
              AND time <= ?4
            "#,
            params![
                tenant_id,
                date.format(DATE_FMT).to_string(),
                window_start.format(TIME_FMT).to_string(),
                window_end.format(TIME_FMT).to_string(),
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 分配下一个展示编号序号 (租户-年度内 MAX+1)
    ///
    /// # 不变式
    /// - 序号基于已有编号的最大值, 删除/取消不会导致复用
    pub fn next_reservation_number(
        &self,
        tenant_id: &str,
        year: i32,
    ) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let prefix = format!("RES-{}-", year);
        // 编号前缀固定9字符 (RES-YYYY-), 其后为序号数字
        let max_seq: Option<i64> = conn.query_row(
            r#"
            SELECT MAX(CAST(substr(reservation_number, 10) AS INTEGER))
            FROM reservation
            WHERE tenant_id = ?1
              AND reservation_number LIKE ?2 || '%'
            "#,
            params![tenant_id, prefix],
            |row| row.get(0),
        )?;
        let seq = max_seq.unwrap_or(0) + 1;
        Ok(Reservation::format_number(year, seq))
    }

    /// 确认任务待发清单: pending 且创建早于 cutoff 且未发确认且有邮箱
    pub fn find_pending_confirmations(
        &self,
        tenant_id: &str,
        created_before: NaiveDateTime,
    ) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM reservation
            WHERE tenant_id = ?1
              AND status = 'pending'
              AND confirmation_sent_at IS NULL
              AND guest_email IS NOT NULL
              AND created_at <= ?2
            ORDER BY created_at ASC
            "#,
            RESERVATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![tenant_id, created_before.format(DATETIME_FMT).to_string()],
            Self::map_row,
        )?;
        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?);
        }
        Ok(reservations)
    }

    /// 提醒任务待发清单: confirmed 且未发提醒且开始时刻落在 [now, until]
    pub fn find_pending_reminders(
        &self,
        tenant_id: &str,
        now: NaiveDateTime,
        until: NaiveDateTime,
    ) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM reservation
            WHERE tenant_id = ?1
              AND status = 'confirmed'
              AND reminder_sent_at IS NULL
              AND (date || ' ' || time) >= ?2
              AND (date || ' ' || time) <= ?3
            ORDER BY date ASC, time ASC
            "#,
            RESERVATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                tenant_id,
                now.format("%Y-%m-%d %H:%M").to_string(),
                until.format("%Y-%m-%d %H:%M").to_string(),
            ],
            Self::map_row,
        )?;
        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?);
        }
        Ok(reservations)
    }

    /// 未到店任务候选清单: pending/confirmed 且开始时刻不晚于 cutoff
    ///
    /// # 参数
    /// - cutoff: now - 宽限期
    pub fn find_potential_no_shows(
        &self,
        tenant_id: &str,
        cutoff: NaiveDateTime,
    ) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM reservation
            WHERE tenant_id = ?1
              AND status IN ('pending', 'confirmed')
              AND (date || ' ' || time) <= ?2
            ORDER BY date ASC, time ASC
            "#,
            RESERVATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![tenant_id, cutoff.format("%Y-%m-%d %H:%M").to_string()],
            Self::map_row,
        )?;
        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?);
        }
        Ok(reservations)
    }

    /// 记录确认邮件已发时间戳 (任务幂等保护: 仅在发送成功后调用)
    pub fn stamp_confirmation_sent(
        &self,
        tenant_id: &str,
        id: &str,
        at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE reservation SET confirmation_sent_at = ?3 WHERE id = ?1 AND tenant_id = ?2",
            params![id, tenant_id, at.format(DATETIME_FMT).to_string()],
        )?;
        Ok(())
    }

    /// 记录提醒邮件已发时间戳 (任务幂等保护: 仅在发送成功后调用)
    pub fn stamp_reminder_sent(
        &self,
        tenant_id: &str,
        id: &str,
        at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE reservation SET reminder_sent_at = ?3 WHERE id = ?1 AND tenant_id = ?2",
            params![id, tenant_id, at.format(DATETIME_FMT).to_string()],
        )?;
        Ok(())
    }
}
