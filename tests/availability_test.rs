// ==========================================
// 可用性判定集成测试
// ==========================================
// 覆盖: 检查顺序短路、阻断消息、替代时间探测、餐桌容量存在性、
//       检查-创建间的非原子窗口
// ==========================================

mod test_helpers;

use dining_reserve::domain::types::{ReservationStatus, TableStatus};
use dining_reserve::engine::EngineError;
use test_helpers::*;

// 2025-06-01 是周日 (day_of_week = 0)
fn sunday() -> chrono::NaiveDate {
    date(2025, 6, 1)
}

fn now_friday_noon() -> chrono::NaiveDateTime {
    datetime(2025, 5, 30, 12, 0)
}

#[test]
fn test_available_slot_reports_table_count() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);
    ctx.insert_table("T2", "2", 1, 8);

    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, sunday(), time(19, 0), 2, now_friday_noon())
        .unwrap();

    assert!(result.available);
    assert_eq!(result.tables_available, 2);
    assert!(result.message.is_none());
    assert!(result.alternative_times.is_empty());
}

#[test]
fn test_reservations_disabled_rejected_first() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);
    ctx.tune_settings(|s| s.accept_reservations = false);

    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, sunday(), time(19, 0), 2, now_friday_noon())
        .unwrap();

    assert!(!result.available);
    assert_eq!(
        result.message.as_deref(),
        Some("Reservations are not currently being accepted")
    );
}

#[test]
fn test_advance_booking_window() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);

    // 45天后: 超出默认30天窗口
    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, date(2025, 7, 15), time(19, 0), 2, now_friday_noon())
        .unwrap();
    assert!(!result.available);
    assert_eq!(
        result.message.as_deref(),
        Some("Reservations can only be made 30 days in advance")
    );

    // 窗口边界内可过
    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, date(2025, 6, 25), time(19, 0), 2, now_friday_noon())
        .unwrap();
    assert!(result.available);
}

#[test]
fn test_closed_day_rejected() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);
    // 周日班次清空 → 视为闭店
    ctx.tune_settings(|s| {
        if let Some(sh) = s.service_hours.iter_mut().find(|sh| sh.day_of_week == 0) {
            sh.shifts.clear();
        }
    });

    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, sunday(), time(19, 0), 2, now_friday_noon())
        .unwrap();

    assert!(!result.available);
    assert_eq!(
        result.message.as_deref(),
        Some("Restaurant is closed on this day")
    );
    assert!(result.alternative_times.is_empty());
}

#[test]
fn test_outside_service_hours_suggests_shift_starts() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);

    // 16:00 落在午市与晚市之间
    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, sunday(), time(16, 0), 2, now_friday_noon())
        .unwrap();

    assert!(!result.available);
    assert_eq!(
        result.message.as_deref(),
        Some("Requested time is outside service hours")
    );
    // 建议 = 当日活跃班次的开始时刻
    assert_eq!(result.alternative_times, vec![time(12, 0), time(18, 0)]);
}

#[test]
fn test_party_size_bounds() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 8);
    ctx.tune_settings(|s| {
        s.min_party_size = 2;
        s.max_party_size = 6;
    });

    let resolver = ctx.lifecycle.resolver();
    let check = |party_size| {
        resolver
            .check(TENANT_ID, sunday(), time(19, 0), party_size, now_friday_noon())
            .unwrap()
    };

    let below = check(1);
    assert!(!below.available);
    assert_eq!(
        below.message.as_deref(),
        Some("Party size must be between 2 and 6")
    );

    // 边界值恰好在上下限内
    assert!(check(2).available);
    assert!(check(6).available);

    let above = check(7);
    assert!(!above.available);
    assert_eq!(
        above.message.as_deref(),
        Some("Party size must be between 2 and 6")
    );
}

#[test]
fn test_availability_not_monotonic_in_party_size() {
    let ctx = setup();
    // 唯一一张桌最多坐4人: 4人可订, 5人无桌可坐但仍在人数上限内
    ctx.insert_table("T1", "1", 1, 4);

    let resolver = ctx.lifecycle.resolver();
    let four = resolver
        .check(TENANT_ID, sunday(), time(19, 0), 4, now_friday_noon())
        .unwrap();
    assert!(four.available);

    let five = resolver
        .check(TENANT_ID, sunday(), time(19, 0), 5, now_friday_noon())
        .unwrap();
    assert!(!five.available);
    // 容量不足的拒绝不带消息 (调用方给统一兜底文案)
    assert!(five.message.is_none());
    assert_eq!(five.tables_available, 0);
    // 换时间也坐不下: 无替代建议
    assert!(five.alternative_times.is_empty());
}

#[test]
fn test_create_falls_back_to_generic_message_when_no_table_fits() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);

    let err = ctx
        .lifecycle
        .create(
            TENANT_ID,
            create_request(sunday(), time(19, 0), 5),
            now_friday_noon(),
        )
        .unwrap_err();

    match err {
        EngineError::SlotUnavailable(msg) => assert_eq!(msg, "Time slot not available"),
        other => panic!("期望 SlotUnavailable, 实际 {:?}", other),
    }
}

#[test]
fn test_full_slot_suggests_alternatives() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);
    ctx.tune_settings(|s| s.max_reservations_per_slot = 1);

    // 占满 19:00 时段
    ctx.lifecycle
        .create(
            TENANT_ID,
            create_request(sunday(), time(19, 0), 2),
            now_friday_noon(),
        )
        .unwrap();

    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, sunday(), time(19, 0), 2, now_friday_noon())
        .unwrap();

    assert!(!result.available);
    assert_eq!(result.tables_available, 0);
    assert_eq!(result.message.as_deref(), Some("Time slot is fully booked"));
    // 偏移探测: -90 在班次外, -60/-30 仍与已占时段重叠, +30/+60/+90 可过
    assert_eq!(
        result.alternative_times,
        vec![time(19, 30), time(20, 0), time(20, 30)]
    );
    assert!(!result.alternative_times.contains(&time(19, 0)));
    assert!(result.alternative_times.len() <= 3);
}

#[test]
fn test_slot_capacity_counts_only_active_reservations() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);
    ctx.tune_settings(|s| s.max_reservations_per_slot = 1);

    let created = ctx
        .lifecycle
        .create(
            TENANT_ID,
            create_request(sunday(), time(19, 0), 2),
            now_friday_noon(),
        )
        .unwrap();

    // 取消后时段容量回收
    ctx.lifecycle
        .cancel(TENANT_ID, &created.id, None, now_friday_noon())
        .unwrap();

    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, sunday(), time(19, 0), 2, now_friday_noon())
        .unwrap();
    assert!(result.available);
}

#[test]
fn test_table_count_ignores_table_status() {
    let ctx = setup();
    // 桌已被挂为 reserved: 检查6仅按容量统计, 仍视为存在可坐的桌
    ctx.insert_table_for(TENANT_ID, "T1", "1", 1, 4, TableStatus::Reserved);

    let result = ctx
        .lifecycle
        .resolver()
        .check(TENANT_ID, sunday(), time(19, 0), 2, now_friday_noon())
        .unwrap();

    assert!(result.available);
    assert_eq!(result.tables_available, 1);
}

#[test]
fn test_check_then_create_window_is_not_atomic() {
    let ctx = setup();
    ctx.insert_table("T1", "1", 1, 4);
    ctx.tune_settings(|s| s.max_reservations_per_slot = 1);

    let resolver = ctx.lifecycle.resolver();
    let now = now_friday_noon();

    // 两个调用方都在对方落库前完成检查
    let first = resolver
        .check(TENANT_ID, sunday(), time(19, 0), 2, now)
        .unwrap();
    let second = resolver
        .check(TENANT_ID, sunday(), time(19, 0), 2, now)
        .unwrap();
    assert!(first.available);
    assert!(second.available);

    // 双方各自落库: 都会成功, 时段实际超卖
    let r1 = raw_reservation(
        "r-1",
        "RES-2025-0001",
        sunday(),
        time(19, 0),
        2,
        ReservationStatus::Pending,
        now,
    );
    let r2 = raw_reservation(
        "r-2",
        "RES-2025-0002",
        sunday(),
        time(19, 0),
        2,
        ReservationStatus::Pending,
        now,
    );
    ctx.repos.reservation_repo.insert(&r1).unwrap();
    ctx.repos.reservation_repo.insert(&r2).unwrap();

    let count = ctx
        .repos
        .reservation_repo
        .count_active_in_window(TENANT_ID, sunday(), time(18, 45), time(20, 45))
        .unwrap();
    assert_eq!(count, 2);

    // 后续检查恢复正确拒绝
    let after = resolver
        .check(TENANT_ID, sunday(), time(19, 0), 2, now)
        .unwrap();
    assert!(!after.available);
    assert_eq!(after.message.as_deref(), Some("Time slot is fully booked"));
}
