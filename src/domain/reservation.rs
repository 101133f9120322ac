// ==========================================
// 多租户餐厅预订系统 - 预订领域模型
// ==========================================
// 对齐: reservation 表
// 不变式: 每条预订归属唯一租户; 展示编号在租户-年度内不复用
// ==========================================

use crate::domain::types::{ReservationChannel, ReservationStatus};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Reservation - 预订
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    // ===== 主键与归属 =====
    pub id: String,        // UUID
    pub tenant_id: String, // 租户ID

    // ===== 展示编号 =====
    // 格式: RES-<年份>-<序号:04>, 租户-年度内顺序分配且不复用
    pub reservation_number: String,

    // ===== 客人信息 =====
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,

    // ===== 预订参数 =====
    pub date: NaiveDate,        // 预订日期
    pub time: NaiveTime,        // 预订时刻
    pub party_size: i32,        // 用餐人数
    pub duration_minutes: i32,  // 预估用餐时长 (默认120分钟)

    // ===== 餐桌弱引用 (可空) =====
    // 非空时其容量必须覆盖 party_size
    pub table_id: Option<String>,
    pub table_number: Option<String>, // 冗余字段, 仅用于展示
    pub section: Option<String>,      // 冗余字段, 仅用于展示

    // ===== 状态与渠道 =====
    pub status: ReservationStatus,
    pub channel: ReservationChannel,

    // ===== 备注 =====
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,

    // ===== 生命周期时间戳 =====
    pub confirmation_sent_at: Option<NaiveDateTime>,
    pub reminder_sent_at: Option<NaiveDateTime>,
    pub seated_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,

    // ===== 关联订单 (可空) =====
    pub order_id: Option<String>,

    // ===== 创建时间 =====
    pub created_at: NaiveDateTime,
}

impl Reservation {
    /// 预订开始时刻 (日期 + 时刻)
    pub fn start_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// 是否持有餐桌引用
    pub fn has_table(&self) -> bool {
        self.table_id.is_some()
    }

    /// 格式化展示编号
    ///
    /// # 规则
    /// - RES-<year>-<seq:04>, 例如 RES-2025-0004
    pub fn format_number(year: i32, seq: i64) -> String {
        format!("RES-{}-{:04}", year, seq)
    }
}

// ==========================================
// ReservationQuery - 列表查询过滤条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReservationQuery {
    pub date: Option<NaiveDate>,                    // 精确日期
    pub start: Option<NaiveDate>,                   // 日期范围起
    pub end: Option<NaiveDate>,                     // 日期范围止
    pub status: Option<ReservationStatus>,          // 状态过滤
    pub guest_name: Option<String>,                 // 姓名子串 (不区分大小写)
    pub guest_phone: Option<String>,                // 电话子串
}
