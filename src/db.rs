// ==========================================
// 多租户餐厅预订系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供 schema 引导, 供服务启动与测试共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(v)
}

/// 初始化数据库 schema (幂等)
///
/// # 表
/// - tenant: 租户与功能开关
/// - reservation_settings: 每租户预订策略 (service_hours 为 JSON 列)
/// - dining_table: 餐桌清单
/// - reservation: 预订记录
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS tenant (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            reservations_enabled INTEGER NOT NULL DEFAULT 1,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS reservation_settings (
            tenant_id TEXT PRIMARY KEY REFERENCES tenant(id),
            accept_reservations INTEGER NOT NULL,
            advance_booking_days INTEGER NOT NULL,
            min_party_size INTEGER NOT NULL,
            max_party_size INTEGER NOT NULL,
            slot_duration_minutes INTEGER NOT NULL,
            buffer_minutes INTEGER NOT NULL,
            max_reservations_per_slot INTEGER NOT NULL,
            max_reservations_per_day INTEGER NOT NULL,
            service_hours TEXT NOT NULL,
            send_confirmation_email INTEGER NOT NULL,
            send_reminder_email INTEGER NOT NULL,
            reminder_hours_before INTEGER NOT NULL,
            cancellation_window_hours INTEGER NOT NULL,
            require_deposit INTEGER NOT NULL,
            deposit_amount REAL NOT NULL,
            auto_confirm INTEGER NOT NULL,
            no_show_grace_minutes INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dining_table (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenant(id),
            table_number TEXT NOT NULL,
            section TEXT NOT NULL,
            min_capacity INTEGER NOT NULL,
            max_capacity INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'available',
            is_active INTEGER NOT NULL DEFAULT 1,
            guest_count INTEGER,
            seated_at TEXT,
            UNIQUE(tenant_id, table_number)
        );

        CREATE TABLE IF NOT EXISTS reservation (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL REFERENCES tenant(id),
            reservation_number TEXT NOT NULL,
            guest_name TEXT NOT NULL,
            guest_phone TEXT NOT NULL,
            guest_email TEXT,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            party_size INTEGER NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 120,
            table_id TEXT,
            table_number TEXT,
            section TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            channel TEXT NOT NULL DEFAULT 'phone',
            notes TEXT,
            cancel_reason TEXT,
            confirmation_sent_at TEXT,
            reminder_sent_at TEXT,
            seated_at TEXT,
            completed_at TEXT,
            cancelled_at TEXT,
            order_id TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(tenant_id, reservation_number)
        );

        CREATE INDEX IF NOT EXISTS idx_reservation_tenant_date
            ON reservation(tenant_id, date);
        CREATE INDEX IF NOT EXISTS idx_reservation_tenant_status
            ON reservation(tenant_id, status);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
