// ==========================================
// 多租户餐厅预订系统 - 预订策略领域模型
// ==========================================
// 对齐: reservation_settings 表 (每租户一行, 读时缺省创建)
// 职责: 营业时段/容量上限/提前量/通知开关等租户策略
// ==========================================

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Shift - 营业班次
// ==========================================
// 一天内有名称、有时间边界的服务窗口 (如午市/晚市)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub name: String,        // 班次名称
    pub start: NaiveTime,    // 开始时刻
    pub end: NaiveTime,      // 结束时刻
    pub is_active: bool,     // 停用的班次不参与判定
}

impl Shift {
    /// 时刻是否落在班次内 (闭区间)
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

// ==========================================
// ServiceHours - 单日营业时段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHours {
    pub day_of_week: u32, // 0=周日 .. 6=周六
    pub shifts: Vec<Shift>,
}

impl ServiceHours {
    /// 该日是否存在覆盖指定时刻的活跃班次
    pub fn covers(&self, time: NaiveTime) -> bool {
        self.shifts
            .iter()
            .any(|s| s.is_active && s.contains(time))
    }

    /// 活跃班次的开始时刻列表 (用于建议时间)
    pub fn active_start_times(&self) -> Vec<NaiveTime> {
        self.shifts
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.start)
            .collect()
    }
}

// ==========================================
// ReservationSettings - 租户预订策略
// ==========================================
// 读时缺省创建: 首次读取即以默认值落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationSettings {
    pub tenant_id: String,

    // ===== 总开关 =====
    pub accept_reservations: bool,

    // ===== 预订窗口与人数 =====
    pub advance_booking_days: i32, // 最大提前预订天数
    pub min_party_size: i32,
    pub max_party_size: i32,

    // ===== 时段容量 =====
    pub slot_duration_minutes: i32,     // 时段时长
    pub buffer_minutes: i32,            // 时段两侧缓冲
    pub max_reservations_per_slot: i32, // 单时段上限
    pub max_reservations_per_day: i32,  // 单日上限

    // ===== 营业时段 (7天 × 班次, JSON 列存储) =====
    pub service_hours: Vec<ServiceHours>,

    // ===== 通知 =====
    pub send_confirmation_email: bool,
    pub send_reminder_email: bool,
    pub reminder_hours_before: i32, // 提醒提前量 (小时)

    // ===== 取消/定金策略 =====
    pub cancellation_window_hours: i32,
    pub require_deposit: bool,
    pub deposit_amount: f64,

    // ===== 自动化 =====
    pub auto_confirm: bool,           // 创建即确认
    pub no_show_grace_minutes: i32,   // 未到店宽限期 (分钟)
}

impl ReservationSettings {
    /// 租户默认策略
    ///
    /// # 默认值
    /// - 接受预订, 提前30天, 1-12人
    /// - 时段90分钟 + 缓冲15分钟, 单时段10组, 单日100组
    /// - 每天午市 12:00-15:00 / 晚市 18:00-22:00
    /// - 确认/提醒邮件开启, 提醒提前24小时
    /// - 不自动确认, 未到店宽限15分钟
    pub fn default_for(tenant_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            accept_reservations: true,
            advance_booking_days: 30,
            min_party_size: 1,
            max_party_size: 12,
            slot_duration_minutes: 90,
            buffer_minutes: 15,
            max_reservations_per_slot: 10,
            max_reservations_per_day: 100,
            service_hours: Self::default_service_hours(),
            send_confirmation_email: true,
            send_reminder_email: true,
            reminder_hours_before: 24,
            cancellation_window_hours: 2,
            require_deposit: false,
            deposit_amount: 0.0,
            auto_confirm: false,
            no_show_grace_minutes: 15,
        }
    }

    /// 默认营业时段: 全周午市/晚市
    pub fn default_service_hours() -> Vec<ServiceHours> {
        (0..7)
            .map(|day_of_week| ServiceHours {
                day_of_week,
                shifts: vec![
                    Shift {
                        name: "lunch".to_string(),
                        start: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                        end: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                        is_active: true,
                    },
                    Shift {
                        name: "dinner".to_string(),
                        start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                        end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                        is_active: true,
                    },
                ],
            })
            .collect()
    }

    /// 查指定星期的营业时段 (0=周日 .. 6=周六)
    pub fn service_hours_for(&self, day_of_week: u32) -> Option<&ServiceHours> {
        self.service_hours
            .iter()
            .find(|sh| sh.day_of_week == day_of_week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_contains_inclusive() {
        let shift = Shift {
            name: "dinner".to_string(),
            start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            is_active: true,
        };
        assert!(shift.contains(NaiveTime::from_hms_opt(18, 0, 0).unwrap()));
        assert!(shift.contains(NaiveTime::from_hms_opt(22, 0, 0).unwrap()));
        assert!(!shift.contains(NaiveTime::from_hms_opt(22, 1, 0).unwrap()));
    }

    #[test]
    fn test_default_service_hours_cover_week() {
        let settings = ReservationSettings::default_for("TEN1");
        assert_eq!(settings.service_hours.len(), 7);
        for day in 0..7 {
            let sh = settings.service_hours_for(day).expect("missing day");
            assert!(sh.covers(NaiveTime::from_hms_opt(19, 0, 0).unwrap()));
            assert!(!sh.covers(NaiveTime::from_hms_opt(16, 0, 0).unwrap()));
        }
    }

    #[test]
    fn test_inactive_shift_not_covering() {
        let sh = ServiceHours {
            day_of_week: 1,
            shifts: vec![Shift {
                name: "dinner".to_string(),
                start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
                is_active: false,
            }],
        };
        assert!(!sh.covers(NaiveTime::from_hms_opt(19, 0, 0).unwrap()));
        assert!(sh.active_start_times().is_empty());
    }
}
