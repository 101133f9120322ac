// ==========================================
// 多租户餐厅预订系统 - 预订策略数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑 (缺省创建由 SettingsStore 负责)
// 职责: 管理 reservation_settings 表 (每租户一行)
// ==========================================

use crate::domain::settings::{ReservationSettings, ServiceHours};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// reservation_settings 表的全列清单 (SELECT 共用)
const SETTINGS_COLUMNS: &str = r#"
    tenant_id, accept_reservations, advance_booking_days,
    min_party_size, max_party_size,
    slot_duration_minutes, buffer_minutes,
    max_reservations_per_slot, max_reservations_per_day,
    service_hours,
    send_confirmation_email, send_reminder_email, reminder_hours_before,
    cancellation_window_hours, require_deposit, deposit_amount,
    auto_confirm, no_show_grace_minutes
"#;

// ==========================================
// ReservationSettingsRepository - 预订策略仓储
// ==========================================

/// 预订策略仓储
pub struct ReservationSettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationSettingsRepository {
    /// 创建新的预订策略仓储实例
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

    /// 行 → 领域实体 (service_hours 为 JSON 列)
    fn map_row(row: &Row<'_>) -> rusqlite::Result<(ReservationSettings, String)> {
        let service_hours_json: String = row.get(9)?;
        let settings = ReservationSettings {
            tenant_id: row.get(0)?,
            accept_reservations: row.get(1)?,
            advance_booking_days: row.get(2)?,
            min_party_size: row.get(3)?,
            max_party_size: row.get(4)?,
            slot_duration_minutes: row.get(5)?,
            buffer_minutes: row.get(6)?,
            max_reservations_per_slot: row.get(7)?,
            max_reservations_per_day: row.get(8)?,
            service_hours: Vec::new(), // JSON 在锁外解析
            send_confirmation_email: row.get(10)?,
            send_reminder_email: row.get(11)?,
            reminder_hours_before: row.get(12)?,
            cancellation_window_hours: row.get(13)?,
            require_deposit: row.get(14)?,
            deposit_amount: row.get(15)?,
            auto_confirm: row.get(16)?,
            no_show_grace_minutes: row.get(17)?,
        };
        Ok((settings, service_hours_json))
    }

    /// 按租户查询
    pub fn find_by_tenant(
        &self,
        tenant_id: &str,
    ) -> RepositoryResult<Option<ReservationSettings>> {
        let row = {
            let conn = self.get_conn()?;
            let sql = format!(
                "SELECT {} FROM reservation_settings WHERE tenant_id = ?1",
                SETTINGS_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_row(params![tenant_id], Self::map_row).optional()?
        };

        match row {
            Some((mut settings, service_hours_json)) => {
                let service_hours: Vec<ServiceHours> =
                    serde_json::from_str(&service_hours_json)?;
                settings.service_hours = service_hours;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    /// 写入一行策略
    pub fn insert(&self, settings: &ReservationSettings) -> RepositoryResult<()> {
        let service_hours_json = serde_json::to_string(&settings.service_hours)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reservation_settings (
                tenant_id, accept_reservations, advance_booking_days,
                min_party_size, max_party_size,
                slot_duration_minutes, buffer_minutes,
                max_reservations_per_slot, max_reservations_per_day,
                service_hours,
                send_confirmation_email, send_reminder_email, reminder_hours_before,
                cancellation_window_hours, require_deposit, deposit_amount,
                auto_confirm, no_show_grace_minutes
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            params![
                settings.tenant_id,
                settings.accept_reservations,
                settings.advance_booking_days,
                settings.min_party_size,
                settings.max_party_size,
                settings.slot_duration_minutes,
                settings.buffer_minutes,
                settings.max_reservations_per_slot,
                settings.max_reservations_per_day,
                service_hours_json,
                settings.send_confirmation_email,
                settings.send_reminder_email,
                settings.reminder_hours_before,
                settings.cancellation_window_hours,
                settings.require_deposit,
                settings.deposit_amount,
                settings.auto_confirm,
                settings.no_show_grace_minutes,
            ],
        )?;
        Ok(())
    }

    /// 整行更新
    pub fn update(&self, settings: &ReservationSettings) -> RepositoryResult<()> {
        let service_hours_json = serde_json::to_string(&settings.service_hours)?;
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE reservation_settings SET
                accept_reservations = ?2, advance_booking_days = ?3,
                min_party_size = ?4, max_party_size = ?5,
                slot_duration_minutes = ?6, buffer_minutes = ?7,
                max_reservations_per_slot = ?8, max_reservations_per_day = ?9,
                service_hours = ?10,
                send_confirmation_email = ?11, send_reminder_email = ?12,
                reminder_hours_before = ?13,
                cancellation_window_hours = ?14, require_deposit = ?15,
                deposit_amount = ?16,
                auto_confirm = ?17, no_show_grace_minutes = ?18
            WHERE tenant_id = ?1
            "#,
            params![
                settings.tenant_id,
                settings.accept_reservations,
                settings.advance_booking_days,
                settings.min_party_size,
                settings.max_party_size,
                settings.slot_duration_minutes,
                settings.buffer_minutes,
                settings.max_reservations_per_slot,
                settings.max_reservations_per_day,
                service_hours_json,
                settings.send_confirmation_email,
                settings.send_reminder_email,
                settings.reminder_hours_before,
                settings.cancellation_window_hours,
                settings.require_deposit,
                settings.deposit_amount,
                settings.auto_confirm,
                settings.no_show_grace_minutes,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ReservationSettings".to_string(),
                id: settings.tenant_id.clone(),
            });
        }
        Ok(())
    }
}
