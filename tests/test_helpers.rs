// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、租户/餐桌/预订种子数据
// ==========================================
#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use tempfile::NamedTempFile;

use dining_reserve::db;
use dining_reserve::domain::{
    DiningTable, Reservation, ReservationSettings, Tenant,
};
use dining_reserve::domain::types::{ReservationChannel, ReservationStatus, TableStatus};
use dining_reserve::engine::{
    CreateReservationRequest, ReservationLifecycle, ReservationRepositories, SettingsStore,
};

/// 默认测试租户ID
pub const TENANT_ID: &str = "tenant-1";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接 (统一 PRAGMA)
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(db::open_sqlite_connection(db_path)?)
}

/// 测试上下文: 临时库 + 仓储集合 + 生命周期引擎
pub struct TestContext {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub repos: ReservationRepositories,
    pub lifecycle: Arc<ReservationLifecycle>,
    pub settings_store: Arc<SettingsStore>,
}

/// 搭建测试上下文并种入默认租户
pub fn setup() -> TestContext {
    dining_reserve::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = db::open_sqlite_connection(&db_path).expect("Failed to open db");
    let repos = ReservationRepositories::from_connection(Arc::new(Mutex::new(conn)));

    repos
        .tenant_repo
        .insert(&Tenant {
            id: TENANT_ID.to_string(),
            name: "测试餐厅".to_string(),
            reservations_enabled: true,
            is_active: true,
        })
        .expect("Failed to insert tenant");

    let settings_store = Arc::new(SettingsStore::new(Arc::clone(&repos.settings_repo)));
    let lifecycle = Arc::new(ReservationLifecycle::new(repos.clone()));

    TestContext {
        _temp_file: temp_file,
        db_path,
        repos,
        lifecycle,
        settings_store,
    }
}

impl TestContext {
    /// 追加一个租户
    pub fn insert_tenant(&self, id: &str, reservations_enabled: bool) {
        self.repos
            .tenant_repo
            .insert(&Tenant {
                id: id.to_string(),
                name: format!("租户 {}", id),
                reservations_enabled,
                is_active: true,
            })
            .expect("Failed to insert tenant");
    }

    /// 种入一张餐桌
    pub fn insert_table(&self, id: &str, number: &str, min: i32, max: i32) -> DiningTable {
        self.insert_table_for(TENANT_ID, id, number, min, max, TableStatus::Available)
    }

    /// 种入一张指定状态的餐桌
    pub fn insert_table_for(
        &self,
        tenant_id: &str,
        id: &str,
        number: &str,
        min: i32,
        max: i32,
        status: TableStatus,
    ) -> DiningTable {
        let table = DiningTable {
            id: id.to_string(),
            tenant_id: tenant_id.to_string(),
            table_number: number.to_string(),
            section: "main".to_string(),
            min_capacity: min,
            max_capacity: max,
            status,
            is_active: true,
            guest_count: None,
            seated_at: None,
        };
        self.repos
            .table_repo
            .insert(&table)
            .expect("Failed to insert table");
        table
    }

    /// 读取当前租户策略 (缺省创建), 调整后落库
    pub fn tune_settings(&self, tune: impl FnOnce(&mut ReservationSettings)) {
        self.tune_settings_for(TENANT_ID, tune);
    }

    pub fn tune_settings_for(
        &self,
        tenant_id: &str,
        tune: impl FnOnce(&mut ReservationSettings),
    ) {
        let mut settings = self
            .settings_store
            .get(tenant_id)
            .expect("Failed to get settings");
        tune(&mut settings);
        self.settings_store
            .update(&settings)
            .expect("Failed to update settings");
    }

    /// 重读一条预订
    pub fn reload(&self, id: &str) -> Reservation {
        self.repos
            .reservation_repo
            .find_by_id(TENANT_ID, id)
            .expect("Failed to query reservation")
            .expect("Reservation missing")
    }

    /// 重读一张餐桌
    pub fn reload_table(&self, id: &str) -> DiningTable {
        self.repos
            .table_repo
            .find_by_id(TENANT_ID, id)
            .expect("Failed to query table")
            .expect("Table missing")
    }
}

// ==========================================
// 日期/时间便捷构造
// ==========================================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    date(y, mo, d).and_time(time(h, mi))
}

// ==========================================
// 请求与实体构造
// ==========================================

/// 基础创建请求 (电话渠道, 带邮箱)
pub fn create_request(
    d: NaiveDate,
    t: NaiveTime,
    party_size: i32,
) -> CreateReservationRequest {
    CreateReservationRequest {
        guest_name: "张三".to_string(),
        guest_phone: "+58-412-5550101".to_string(),
        guest_email: Some("guest@example.com".to_string()),
        date: d,
        time: t,
        party_size,
        duration_minutes: None,
        table_id: None,
        channel: ReservationChannel::Phone,
        notes: None,
    }
}

/// 手工构造一条预订 (绕过引擎直接落库, 用于竞态/仓储测试)
pub fn raw_reservation(
    id: &str,
    number: &str,
    d: NaiveDate,
    t: NaiveTime,
    party_size: i32,
    status: ReservationStatus,
    created_at: NaiveDateTime,
) -> Reservation {
    raw_reservation_for(TENANT_ID, id, number, d, t, party_size, status, created_at)
}

/// 同上, 指定归属租户
#[allow(clippy::too_many_arguments)]
pub fn raw_reservation_for(
    tenant_id: &str,
    id: &str,
    number: &str,
    d: NaiveDate,
    t: NaiveTime,
    party_size: i32,
    status: ReservationStatus,
    created_at: NaiveDateTime,
) -> Reservation {
    Reservation {
        id: id.to_string(),
        tenant_id: tenant_id.to_string(),
        reservation_number: number.to_string(),
        guest_name: "李四".to_string(),
        guest_phone: "+58-414-5550202".to_string(),
        guest_email: Some("liso@example.com".to_string()),
        date: d,
        time: t,
        party_size,
        duration_minutes: 120,
        table_id: None,
        table_number: None,
        section: None,
        status,
        channel: ReservationChannel::Online,
        notes: None,
        cancel_reason: None,
        confirmation_sent_at: None,
        reminder_sent_at: None,
        seated_at: None,
        completed_at: None,
        cancelled_at: None,
        order_id: None,
        created_at,
    }
}
