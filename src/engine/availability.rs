// ==========================================
// 多租户餐厅预订系统 - 可用性判定引擎
// ==========================================
// 职责: 判定 日期/时刻/人数 请求是否可预订, 拒绝时给出替代时间
// 约束: 检查按固定顺序短路, 返回消息为首个阻断原因
// 约束: 替代时间探测为固定偏移列表上的有界迭代, 凑满3个即止, 不递归
// ==========================================

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::domain::settings::{ReservationSettings, ServiceHours};
use crate::engine::error::EngineResult;
use crate::engine::settings_store::SettingsStore;
use crate::repository::{ReservationRepository, TableRepository};

/// 替代时间探测偏移 (分钟): ±30 / ±60 / ±90
pub const ALTERNATIVE_OFFSETS_MINUTES: [i64; 6] = [-90, -60, -30, 30, 60, 90];

/// 替代时间建议上限
pub const MAX_ALTERNATIVES: usize = 3;

// ==========================================
// Availability - 可用性判定结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub available: bool,
    /// 容量覆盖该人数的餐桌数 (仅判定通过时非零)
    pub tables_available: i64,
    /// 拒绝时的替代时间建议 (不含原请求时刻, 最多3个)
    pub alternative_times: Vec<NaiveTime>,
    /// 首个阻断原因 (通过时为 None)
    pub message: Option<String>,
}

impl Availability {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            available: false,
            tables_available: 0,
            alternative_times: Vec::new(),
            message: Some(message.into()),
        }
    }

    fn rejected_with_alternatives(
        message: Option<String>,
        alternative_times: Vec<NaiveTime>,
    ) -> Self {
        Self {
            available: false,
            tables_available: 0,
            alternative_times,
            message,
        }
    }

    fn granted(tables_available: i64) -> Self {
        Self {
            available: true,
            tables_available,
            alternative_times: Vec::new(),
            message: None,
        }
    }
}

// ==========================================
// AvailabilityCore - 纯函数工具类
// ==========================================
// 红线: 无状态、无副作用、无 I/O 操作
pub struct AvailabilityCore;

impl AvailabilityCore {
    /// 计算时段统计窗口 [slot_start - buffer, slot_start + slot + buffer]
    ///
    /// # 规则
    /// - 窗口截断在当日之内 (00:00 / 23:59)
    pub fn slot_window(
        time: NaiveTime,
        slot_duration_minutes: i32,
        buffer_minutes: i32,
    ) -> (NaiveTime, NaiveTime) {
        let minute_of_day = (time.hour() * 60 + time.minute()) as i64;
        let start = (minute_of_day - buffer_minutes as i64).max(0);
        let end =
            (minute_of_day + slot_duration_minutes as i64 + buffer_minutes as i64).min(23 * 60 + 59);
        (
            Self::time_from_minutes(start),
            Self::time_from_minutes(end),
        )
    }

    /// 对请求时刻施加偏移; 越过当日边界时返回 None (该探测跳过)
    pub fn offset_time(time: NaiveTime, offset_minutes: i64) -> Option<NaiveTime> {
        let minute_of_day = (time.hour() * 60 + time.minute()) as i64 + offset_minutes;
        if !(0..=23 * 60 + 59).contains(&minute_of_day) {
            return None;
        }
        Some(Self::time_from_minutes(minute_of_day))
    }

    /// 营业时段外的建议: 当日活跃班次的开始时刻 (不含原请求时刻, 最多3个)
    pub fn suggested_shift_starts(
        service_hours: &ServiceHours,
        requested: NaiveTime,
    ) -> Vec<NaiveTime> {
        service_hours
            .active_start_times()
            .into_iter()
            .filter(|start| *start != requested)
            .take(MAX_ALTERNATIVES)
            .collect()
    }

    fn time_from_minutes(minute_of_day: i64) -> NaiveTime {
        NaiveTime::from_hms_opt(
            (minute_of_day / 60) as u32,
            (minute_of_day % 60) as u32,
            0,
        )
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap())
    }
}

// ==========================================
// AvailabilityResolver - 可用性判定
// ==========================================

/// 可用性判定引擎
pub struct AvailabilityResolver {
    settings_store: Arc<SettingsStore>,
    reservation_repo: Arc<ReservationRepository>,
    table_repo: Arc<TableRepository>,
}

impl AvailabilityResolver {
    pub fn new(
        settings_store: Arc<SettingsStore>,
        reservation_repo: Arc<ReservationRepository>,
        table_repo: Arc<TableRepository>,
    ) -> Self {
        Self {
            settings_store,
            reservation_repo,
            table_repo,
        }
    }

    /// 判定请求是否可预订
    ///
    /// # 检查顺序 (短路, 消息为首个阻断原因)
    /// 1. 租户接受预订
    /// 2. 日期在提前预订窗口内
    /// 3. 星期有营业时段且存在覆盖该时刻的活跃班次
    /// 4. 人数在租户上下限内
    /// 5. 时段容量 (活跃预订数 < 单时段上限)
    /// 6. 存在容量覆盖该人数的餐桌
    pub fn check(
        &self,
        tenant_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: i32,
        now: NaiveDateTime,
    ) -> EngineResult<Availability> {
        let settings = self.settings_store.get(tenant_id)?;
        self.check_with_settings(&settings, tenant_id, date, time, party_size, now, true)
    }

    /// 单次检查 (with_alternatives=false 时为探测模式, 不再生成建议)
    #[allow(clippy::too_many_arguments)]
    fn check_with_settings(
        &self,
        settings: &ReservationSettings,
        tenant_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: i32,
        now: NaiveDateTime,
        with_alternatives: bool,
    ) -> EngineResult<Availability> {
        // 检查1: 租户是否接受预订
        if !settings.accept_reservations {
            return Ok(Availability::rejected(
                "Reservations are not currently being accepted",
            ));
        }

        // 检查2: 提前预订窗口
        let days_until = date
            .and_hms_opt(0, 0, 0)
            .unwrap_or_else(|| now.date().and_time(now.time()))
            .signed_duration_since(now)
            .num_days();
        if days_until > settings.advance_booking_days as i64 {
            return Ok(Availability::rejected(format!(
                "Reservations can only be made {} days in advance",
                settings.advance_booking_days
            )));
        }

        // 检查3: 营业时段
        let day_of_week = date.weekday().num_days_from_sunday();
        let service_hours = settings.service_hours_for(day_of_week);
        let service_hours = match service_hours {
            Some(sh) if !sh.shifts.is_empty() => sh,
            _ => {
                return Ok(Availability::rejected("Restaurant is closed on this day"));
            }
        };
        if !service_hours.covers(time) {
            let alternatives = if with_alternatives {
                AvailabilityCore::suggested_shift_starts(service_hours, time)
            } else {
                Vec::new()
            };
            return Ok(Availability::rejected_with_alternatives(
                Some("Requested time is outside service hours".to_string()),
                alternatives,
            ));
        }

        // 检查4: 人数上下限
        if party_size < settings.min_party_size || party_size > settings.max_party_size {
            return Ok(Availability::rejected(format!(
                "Party size must be between {} and {}",
                settings.min_party_size, settings.max_party_size
            )));
        }

        // 检查5: 时段容量 (窗口 = 时段两侧各加缓冲)
        let (window_start, window_end) = AvailabilityCore::slot_window(
            time,
            settings.slot_duration_minutes,
            settings.buffer_minutes,
        );
        let existing = self.reservation_repo.count_active_in_window(
            tenant_id,
            date,
            window_start,
            window_end,
        )?;
        if existing >= settings.max_reservations_per_slot as i64 {
            let alternatives = if with_alternatives {
                self.probe_alternatives(settings, tenant_id, date, time, party_size, now)?
            } else {
                Vec::new()
            };
            return Ok(Availability::rejected_with_alternatives(
                Some("Time slot is fully booked".to_string()),
                alternatives,
            ));
        }

        // 检查6: 餐桌容量存在性 (仅按容量统计, 不看餐桌状态)
        let tables_available = self.table_repo.count_with_capacity(tenant_id, party_size)?;
        if tables_available == 0 {
            let alternatives = if with_alternatives {
                self.probe_alternatives(settings, tenant_id, date, time, party_size, now)?
            } else {
                Vec::new()
            };
            return Ok(Availability::rejected_with_alternatives(None, alternatives));
        }

        Ok(Availability::granted(tables_available))
    }

    /// 固定偏移探测替代时间: 最多6次探测, 凑满3个通过即止
    ///
    /// # 说明
    /// - 每次探测重跑完整检查链但不再生成建议 (探测不会再探测)
    /// - 越过当日边界的偏移跳过
    fn probe_alternatives(
        &self,
        settings: &ReservationSettings,
        tenant_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        party_size: i32,
        now: NaiveDateTime,
    ) -> EngineResult<Vec<NaiveTime>> {
        let mut alternatives = Vec::new();
        for offset in ALTERNATIVE_OFFSETS_MINUTES {
            let alt_time = match AvailabilityCore::offset_time(time, offset) {
                Some(t) => t,
                None => continue,
            };
            let probe = self.check_with_settings(
                settings, tenant_id, date, alt_time, party_size, now, false,
            )?;
            if probe.available {
                alternatives.push(alt_time);
            }
            if alternatives.len() >= MAX_ALTERNATIVES {
                break;
            }
        }
        Ok(alternatives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::Shift;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_slot_window_basic() {
        // 19:00, 时段90分钟, 缓冲15分钟 → [18:45, 20:45]
        let (start, end) = AvailabilityCore::slot_window(hm(19, 0), 90, 15);
        assert_eq!(start, hm(18, 45));
        assert_eq!(end, hm(20, 45));
    }

    #[test]
    fn test_slot_window_clamped_to_day() {
        let (start, _) = AvailabilityCore::slot_window(hm(0, 10), 90, 30);
        assert_eq!(start, hm(0, 0));
        let (_, end) = AvailabilityCore::slot_window(hm(23, 0), 90, 30);
        assert_eq!(end, hm(23, 59));
    }

    #[test]
    fn test_offset_time_midnight_skip() {
        assert_eq!(AvailabilityCore::offset_time(hm(19, 0), 30), Some(hm(19, 30)));
        assert_eq!(AvailabilityCore::offset_time(hm(19, 0), -90), Some(hm(17, 30)));
        assert_eq!(AvailabilityCore::offset_time(hm(0, 30), -60), None);
        assert_eq!(AvailabilityCore::offset_time(hm(23, 30), 60), None);
    }

    #[test]
    fn test_suggested_shift_starts_excludes_requested() {
        let sh = ServiceHours {
            day_of_week: 5,
            shifts: vec![
                Shift {
                    name: "lunch".to_string(),
                    start: hm(12, 0),
                    end: hm(15, 0),
                    is_active: true,
                },
                Shift {
                    name: "dinner".to_string(),
                    start: hm(18, 0),
                    end: hm(22, 0),
                    is_active: true,
                },
                Shift {
                    name: "late".to_string(),
                    start: hm(22, 30),
                    end: hm(23, 30),
                    is_active: false,
                },
            ],
        };
        // 请求时刻恰为某班次开始: 该时刻被排除
        let suggested = AvailabilityCore::suggested_shift_starts(&sh, hm(12, 0));
        assert_eq!(suggested, vec![hm(18, 0)]);
        // 停用班次不参与建议
        let suggested = AvailabilityCore::suggested_shift_starts(&sh, hm(16, 0));
        assert_eq!(suggested, vec![hm(12, 0), hm(18, 0)]);
    }
}
