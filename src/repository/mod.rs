// ==========================================
// 多租户餐厅预订系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod reservation_repo;
pub mod settings_repo;
pub mod table_repo;
pub mod tenant_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use reservation_repo::ReservationRepository;
pub use settings_repo::ReservationSettingsRepository;
pub use table_repo::TableRepository;
pub use tenant_repo::TenantRepository;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// ==========================================
// 列值解析辅助 (TEXT 列 → chrono/枚举)
// ==========================================
// 存储格式约定: 日期 %Y-%m-%d, 时刻 %H:%M, 时间戳 %Y-%m-%d %H:%M:%S

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
pub(crate) const TIME_FMT: &str = "%H:%M";
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::<dyn std::error::Error + Send + Sync>::from(message),
    )
}

pub(crate) fn parse_date_column(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| conversion_error(idx, format!("非法日期 '{}': {}", s, e)))
}

pub(crate) fn parse_time_column(idx: usize, s: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .map_err(|e| conversion_error(idx, format!("非法时刻 '{}': {}", s, e)))
}

pub(crate) fn parse_datetime_column(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| conversion_error(idx, format!("非法时间戳 '{}': {}", s, e)))
}

pub(crate) fn parse_opt_datetime_column(
    idx: usize,
    s: Option<String>,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    s.map(|s| parse_datetime_column(idx, &s)).transpose()
}

pub(crate) fn parse_enum_column<T>(
    idx: usize,
    s: &str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(s).ok_or_else(|| conversion_error(idx, format!("非法枚举值 '{}'", s)))
}
