// ==========================================
// 多租户餐厅预订系统 - 预订生命周期引擎
// ==========================================
// 职责: 预订状态机 (创建/确认/入座/取消/未到店/完成/修改) 及餐桌副作用
// 设计: 显式状态转换表 (状态 × 动作 → 新状态), 副作用在表判定通过后执行
// 约束: 终态不允许任何转换; 校验失败不产生持久化变更
// ==========================================

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::domain::reservation::{Reservation, ReservationQuery};
use crate::domain::types::{ReservationAction, ReservationChannel, ReservationStatus};
use crate::engine::allocator::TableAllocator;
use crate::engine::availability::AvailabilityResolver;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::ReservationRepositories;
use crate::engine::settings_store::SettingsStore;

/// 默认预估用餐时长 (分钟)
pub const DEFAULT_DURATION_MINUTES: i32 = 120;

// ==========================================
// 状态转换表
// ==========================================

/// 状态转换表: (当前状态, 动作) → 新状态
///
/// # 规则
/// - confirm:      pending → confirmed
/// - seat:         pending/confirmed → seated
/// - cancel:       pending/confirmed/seated → cancelled
/// - mark-no-show: pending/confirmed → no-show
/// - complete:     seated → completed
/// - update:       pending/confirmed/seated → 状态不变
/// - 其余组合一律拒绝 (状态冲突)
pub fn next_status(
    from: ReservationStatus,
    action: ReservationAction,
) -> EngineResult<ReservationStatus> {
    use ReservationAction as A;
    use ReservationStatus as S;

    let next = match (from, action) {
        (S::Pending, A::Confirm) => S::Confirmed,
        (S::Pending | S::Confirmed, A::Seat) => S::Seated,
        (S::Pending | S::Confirmed | S::Seated, A::Cancel) => S::Cancelled,
        (S::Pending | S::Confirmed, A::MarkNoShow) => S::NoShow,
        (S::Seated, A::Complete) => S::Completed,
        (S::Pending | S::Confirmed | S::Seated, A::Update) => from,
        _ => return Err(EngineError::InvalidStateTransition { from, action }),
    };
    Ok(next)
}

// ==========================================
// 请求对象
// ==========================================

/// 创建预订请求
#[derive(Debug, Clone)]
pub struct CreateReservationRequest {
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: i32,
    pub duration_minutes: Option<i32>, // 缺省 120
    pub table_id: Option<String>,      // 缺省时走 best-fit 分配
    pub channel: ReservationChannel,
    pub notes: Option<String>,
}

/// 修改预订请求 (全部字段可选)
#[derive(Debug, Clone, Default)]
pub struct UpdateReservationRequest {
    pub guest_name: Option<String>,
    pub guest_phone: Option<String>,
    pub guest_email: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub party_size: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
}

impl UpdateReservationRequest {
    /// 是否触及需要重新判定可用性的字段
    fn changes_booking_parameters(&self) -> bool {
        self.date.is_some() || self.time.is_some() || self.party_size.is_some()
    }
}

// ==========================================
// ReservationLifecycle - 生命周期引擎
// ==========================================

/// 预订生命周期引擎
pub struct ReservationLifecycle {
    repos: ReservationRepositories,
    settings_store: Arc<SettingsStore>,
    resolver: Arc<AvailabilityResolver>,
    allocator: TableAllocator,
}

impl ReservationLifecycle {
    /// 从仓储集合装配 (resolver/allocator 共享同一批仓储)
    pub fn new(repos: ReservationRepositories) -> Self {
        let settings_store = Arc::new(SettingsStore::new(Arc::clone(&repos.settings_repo)));
        let resolver = Arc::new(AvailabilityResolver::new(
            Arc::clone(&settings_store),
            Arc::clone(&repos.reservation_repo),
            Arc::clone(&repos.table_repo),
        ));
        let allocator = TableAllocator::new(Arc::clone(&repos.table_repo));
        Self {
            repos,
            settings_store,
            resolver,
            allocator,
        }
    }

    /// 可用性判定引擎 (供外部直接查询)
    pub fn resolver(&self) -> &Arc<AvailabilityResolver> {
        &self.resolver
    }

    /// 租户策略存储
    pub fn settings_store(&self) -> &Arc<SettingsStore> {
        &self.settings_store
    }

    // ==========================================
    // 创建
    // ==========================================

    /// 创建预订
    ///
    /// # 流程
    /// 1. 可用性判定, 拒绝时以首个阻断原因报错
    /// 2. 未显式指定餐桌时做 best-fit 分配 (无命中则不带桌创建)
    /// 3. 按租户-年度分配展示编号
    /// 4. auto_confirm 租户直接 confirmed, 否则 pending
    /// 5. 已分配餐桌置 reserved
    pub fn create(
        &self,
        tenant_id: &str,
        request: CreateReservationRequest,
        now: NaiveDateTime,
    ) -> EngineResult<Reservation> {
        let settings = self.settings_store.get(tenant_id)?;

        let availability = self.resolver.check(
            tenant_id,
            request.date,
            request.time,
            request.party_size,
            now,
        )?;
        if !availability.available {
            return Err(EngineError::SlotUnavailable(
                availability
                    .message
                    .unwrap_or_else(|| "Time slot not available".to_string()),
            ));
        }

        // 餐桌: 显式指定需校验存在性与容量, 未指定走 best-fit
        let table = match &request.table_id {
            Some(table_id) => {
                let table = self
                    .repos
                    .table_repo
                    .find_by_id(tenant_id, table_id)?
                    .ok_or_else(|| EngineError::NotFound {
                        entity: "DiningTable".to_string(),
                        id: table_id.clone(),
                    })?;
                if table.max_capacity < request.party_size {
                    return Err(EngineError::Validation(format!(
                        "Table {} cannot seat a party of {}",
                        table.table_number, request.party_size
                    )));
                }
                Some(table)
            }
            None => self.allocator.allocate(tenant_id, request.party_size)?,
        };

        let reservation_number = self
            .repos
            .reservation_repo
            .next_reservation_number(tenant_id, request.date.year())?;

        let status = if settings.auto_confirm {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        };

        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            reservation_number,
            guest_name: request.guest_name,
            guest_phone: request.guest_phone,
            guest_email: request.guest_email,
            date: request.date,
            time: request.time,
            party_size: request.party_size,
            duration_minutes: request.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            table_id: table.as_ref().map(|t| t.id.clone()),
            table_number: table.as_ref().map(|t| t.table_number.clone()),
            section: table.as_ref().map(|t| t.section.clone()),
            status,
            channel: request.channel,
            notes: request.notes,
            cancel_reason: None,
            confirmation_sent_at: None,
            reminder_sent_at: None,
            seated_at: None,
            completed_at: None,
            cancelled_at: None,
            order_id: None,
            created_at: now,
        };

        self.repos.reservation_repo.insert(&reservation)?;

        // 副作用: 已分配餐桌置 reserved
        if let Some(table) = &table {
            self.repos.table_repo.set_status(
                tenant_id,
                &table.id,
                crate::domain::types::TableStatus::Reserved,
            )?;
        }

        tracing::info!(
            tenant_id,
            reservation_number = %reservation.reservation_number,
            guest_name = %reservation.guest_name,
            status = %reservation.status,
            "预订已创建"
        );

        Ok(reservation)
    }

    // ==========================================
    // 状态转换
    // ==========================================

    /// 确认预订 (pending → confirmed), 记录确认发送时间
    pub fn confirm(
        &self,
        tenant_id: &str,
        id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Reservation> {
        let mut reservation = self.get(tenant_id, id)?;
        reservation.status = next_status(reservation.status, ReservationAction::Confirm)?;
        reservation.confirmation_sent_at = Some(now);
        self.repos.reservation_repo.update(&reservation)?;
        Ok(reservation)
    }

    /// 入座 (pending/confirmed → seated)
    ///
    /// # 规则
    /// - 必须显式指定目标餐桌
    /// - 餐桌须为 available/reserved, 否则校验失败
    /// - 餐桌置 occupied 并记录人数与入座时间; 预订冗余桌号/区域同步更新
    /// - 换桌入座时不释放创建时预留的原桌, 原桌保持 reserved (沿用上游行为)
    pub fn seat(
        &self,
        tenant_id: &str,
        id: &str,
        table_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Reservation> {
        let mut reservation = self.get(tenant_id, id)?;
        let next = next_status(reservation.status, ReservationAction::Seat)?;

        let table = self
            .repos
            .table_repo
            .find_by_id(tenant_id, table_id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "DiningTable".to_string(),
                id: table_id.to_string(),
            })?;
        if !table.is_seatable() {
            return Err(EngineError::Validation("Table is not available".to_string()));
        }

        self.repos
            .table_repo
            .mark_occupied(tenant_id, table_id, reservation.party_size, now)?;

        reservation.status = next;
        reservation.seated_at = Some(now);
        reservation.table_id = Some(table.id.clone());
        reservation.table_number = Some(table.table_number.clone());
        reservation.section = Some(table.section.clone());
        self.repos.reservation_repo.update(&reservation)?;

        tracing::info!(
            tenant_id,
            reservation_number = %reservation.reservation_number,
            table_number = %table.table_number,
            "预订已入座"
        );

        Ok(reservation)
    }

    /// 取消 (pending/confirmed/seated → cancelled), 释放已分配餐桌
    pub fn cancel(
        &self,
        tenant_id: &str,
        id: &str,
        reason: Option<String>,
        now: NaiveDateTime,
    ) -> EngineResult<Reservation> {
        let mut reservation = self.get(tenant_id, id)?;
        reservation.status = next_status(reservation.status, ReservationAction::Cancel)?;
        reservation.cancelled_at = Some(now);
        reservation.cancel_reason = reason;

        self.release_table(&reservation)?;
        self.repos.reservation_repo.update(&reservation)?;

        tracing::info!(
            tenant_id,
            reservation_number = %reservation.reservation_number,
            "预订已取消"
        );

        Ok(reservation)
    }

    /// 标记未到店 (pending/confirmed → no-show), 释放已分配餐桌
    pub fn mark_no_show(&self, tenant_id: &str, id: &str) -> EngineResult<Reservation> {
        let mut reservation = self.get(tenant_id, id)?;
        reservation.status = next_status(reservation.status, ReservationAction::MarkNoShow)?;

        self.release_table(&reservation)?;
        self.repos.reservation_repo.update(&reservation)?;

        tracing::info!(
            tenant_id,
            reservation_number = %reservation.reservation_number,
            "预订已标记未到店"
        );

        Ok(reservation)
    }

    /// 完成 (seated → completed), 释放餐桌
    pub fn complete(
        &self,
        tenant_id: &str,
        id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Reservation> {
        let mut reservation = self.get(tenant_id, id)?;
        reservation.status = next_status(reservation.status, ReservationAction::Complete)?;
        reservation.completed_at = Some(now);

        self.release_table(&reservation)?;
        self.repos.reservation_repo.update(&reservation)?;
        Ok(reservation)
    }

    /// 修改预订 (任意非终态)
    ///
    /// # 规则
    /// - 触及日期/时刻/人数时, 先按新参数重新判定可用性, 拒绝则不落库
    /// - 已分配餐桌的, 新人数须仍在该桌容量内
    pub fn update(
        &self,
        tenant_id: &str,
        id: &str,
        request: UpdateReservationRequest,
        now: NaiveDateTime,
    ) -> EngineResult<Reservation> {
        let mut reservation = self.get(tenant_id, id)?;
        // 终态拒绝 (状态本身不变)
        let _ = next_status(reservation.status, ReservationAction::Update)?;

        if request.changes_booking_parameters() {
            let date = request.date.unwrap_or(reservation.date);
            let time = request.time.unwrap_or(reservation.time);
            let party_size = request.party_size.unwrap_or(reservation.party_size);
            let availability = self
                .resolver
                .check(tenant_id, date, time, party_size, now)?;
            if !availability.available {
                return Err(EngineError::SlotUnavailable(
                    "New time slot not available".to_string(),
                ));
            }
        }

        if let Some(party_size) = request.party_size {
            if let Some(table_id) = &reservation.table_id {
                let table = self
                    .repos
                    .table_repo
                    .find_by_id(tenant_id, table_id)?
                    .ok_or_else(|| EngineError::NotFound {
                        entity: "DiningTable".to_string(),
                        id: table_id.clone(),
                    })?;
                if table.max_capacity < party_size {
                    return Err(EngineError::Validation(format!(
                        "Table {} cannot seat a party of {}",
                        table.table_number, party_size
                    )));
                }
            }
        }

        if let Some(guest_name) = request.guest_name {
            reservation.guest_name = guest_name;
        }
        if let Some(guest_phone) = request.guest_phone {
            reservation.guest_phone = guest_phone;
        }
        if let Some(guest_email) = request.guest_email {
            reservation.guest_email = Some(guest_email);
        }
        if let Some(date) = request.date {
            reservation.date = date;
        }
        if let Some(time) = request.time {
            reservation.time = time;
        }
        if let Some(party_size) = request.party_size {
            reservation.party_size = party_size;
        }
        if let Some(duration_minutes) = request.duration_minutes {
            reservation.duration_minutes = duration_minutes;
        }
        if let Some(notes) = request.notes {
            reservation.notes = Some(notes);
        }

        self.repos.reservation_repo.update(&reservation)?;
        Ok(reservation)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按ID查询, 缺失报"未找到"
    pub fn get(&self, tenant_id: &str, id: &str) -> EngineResult<Reservation> {
        self.repos
            .reservation_repo
            .find_by_id(tenant_id, id)?
            .ok_or_else(|| EngineError::NotFound {
                entity: "Reservation".to_string(),
                id: id.to_string(),
            })
    }

    /// 列表查询
    pub fn find_all(
        &self,
        tenant_id: &str,
        query: &ReservationQuery,
    ) -> EngineResult<Vec<Reservation>> {
        Ok(self.repos.reservation_repo.find_all(tenant_id, query)?)
    }

    /// 日历视图: 指定月份的活跃预订
    pub fn calendar(
        &self,
        tenant_id: &str,
        year: i32,
        month: u32,
    ) -> EngineResult<Vec<Reservation>> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::Validation(format!(
                "Invalid month: {}",
                month
            )));
        }
        Ok(self
            .repos
            .reservation_repo
            .find_by_month(tenant_id, year, month)?)
    }

    // ==========================================
    // 内部
    // ==========================================

    /// 释放预订持有的餐桌 (无桌时为空操作)
    fn release_table(&self, reservation: &Reservation) -> EngineResult<()> {
        if let Some(table_id) = &reservation.table_id {
            self.repos.table_repo.release(&reservation.tenant_id, table_id)?;
        }
        Ok(())
    }
}

// ==========================================
// 状态转换表测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [ReservationStatus; 6] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::Seated,
        ReservationStatus::Completed,
        ReservationStatus::Cancelled,
        ReservationStatus::NoShow,
    ];

    const ALL_ACTIONS: [ReservationAction; 6] = [
        ReservationAction::Confirm,
        ReservationAction::Seat,
        ReservationAction::Cancel,
        ReservationAction::MarkNoShow,
        ReservationAction::Complete,
        ReservationAction::Update,
    ];

    /// 表内组合与期望新状态
    fn expected(
        from: ReservationStatus,
        action: ReservationAction,
    ) -> Option<ReservationStatus> {
        use ReservationAction as A;
        use ReservationStatus as S;
        match (from, action) {
            (S::Pending, A::Confirm) => Some(S::Confirmed),
            (S::Pending | S::Confirmed, A::Seat) => Some(S::Seated),
            (S::Pending | S::Confirmed | S::Seated, A::Cancel) => Some(S::Cancelled),
            (S::Pending | S::Confirmed, A::MarkNoShow) => Some(S::NoShow),
            (S::Seated, A::Complete) => Some(S::Completed),
            (S::Pending | S::Confirmed | S::Seated, A::Update) => Some(from),
            _ => None,
        }
    }

    #[test]
    fn test_transition_table_exhaustive() {
        // 全量 (状态 × 动作) 组合: 表内成功且结果正确, 表外一律状态冲突
        for from in ALL_STATUSES {
            for action in ALL_ACTIONS {
                match expected(from, action) {
                    Some(next) => {
                        assert_eq!(
                            next_status(from, action).unwrap(),
                            next,
                            "({}, {}) 应转换到 {}",
                            from,
                            action,
                            next
                        );
                    }
                    None => {
                        let err = next_status(from, action).unwrap_err();
                        assert!(
                            matches!(err, EngineError::InvalidStateTransition { .. }),
                            "({}, {}) 应拒绝",
                            from,
                            action
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        for from in ALL_STATUSES.into_iter().filter(|s| s.is_terminal()) {
            for action in ALL_ACTIONS {
                assert!(
                    next_status(from, action).is_err(),
                    "终态 {} 不应允许动作 {}",
                    from,
                    action
                );
            }
        }
    }
}
