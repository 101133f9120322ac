// ==========================================
// 多租户餐厅预订系统 - 未到店检测调度任务
// ==========================================
// 职责: 周期扫描逾期未入座的预订, 经生命周期引擎标记未到店
// 约束: 逾期判定 = 预订开始时刻 + 租户宽限期 ≤ now
// ==========================================

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};

use crate::domain::tenant::Tenant;
use crate::engine::error::EngineResult;
use crate::engine::lifecycle::ReservationLifecycle;
use crate::engine::settings_store::SettingsStore;
use crate::repository::{ReservationRepository, TenantRepository};
use crate::scheduler::JobRunSummary;

// ==========================================
// NoShowJob - 未到店检测任务
// ==========================================

/// 未到店检测任务
pub struct NoShowJob {
    tenant_repo: Arc<TenantRepository>,
    settings_store: Arc<SettingsStore>,
    reservation_repo: Arc<ReservationRepository>,
    lifecycle: Arc<ReservationLifecycle>,
}

impl NoShowJob {
    pub fn new(
        tenant_repo: Arc<TenantRepository>,
        settings_store: Arc<SettingsStore>,
        reservation_repo: Arc<ReservationRepository>,
        lifecycle: Arc<ReservationLifecycle>,
    ) -> Self {
        Self {
            tenant_repo,
            settings_store,
            reservation_repo,
            lifecycle,
        }
    }

    /// 执行一轮扫描 (失败隔离同其他任务)
    pub fn run_once(&self, now: NaiveDateTime) -> EngineResult<JobRunSummary> {
        let tenants = self.tenant_repo.list_with_reservations_enabled()?;
        let mut summary = JobRunSummary {
            tenants: tenants.len(),
            ..JobRunSummary::default()
        };

        for tenant in &tenants {
            if let Err(e) = self.run_tenant(tenant, now, &mut summary) {
                tracing::error!(
                    tenant_id = %tenant.id,
                    error = %e,
                    "未到店任务租户级失败, 跳过该租户剩余项"
                );
            }
        }

        tracing::info!(
            tenants = summary.tenants,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "未到店任务一轮完成"
        );
        Ok(summary)
    }

    fn run_tenant(
        &self,
        tenant: &Tenant,
        now: NaiveDateTime,
        summary: &mut JobRunSummary,
    ) -> EngineResult<()> {
        let settings = self.settings_store.get(&tenant.id)?;
        let cutoff = now - Duration::minutes(settings.no_show_grace_minutes as i64);

        let overdue = self
            .reservation_repo
            .find_potential_no_shows(&tenant.id, cutoff)?;

        for reservation in overdue {
            summary.processed += 1;
            match self.lifecycle.mark_no_show(&tenant.id, &reservation.id) {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        tenant_id = %tenant.id,
                        reservation_number = %reservation.reservation_number,
                        error = %e,
                        "标记未到店失败"
                    );
                }
            }
        }
        Ok(())
    }
}
