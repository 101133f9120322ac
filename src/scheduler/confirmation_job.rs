// ==========================================
// 多租户餐厅预订系统 - 确认邮件调度任务
// ==========================================
// 职责: 周期扫描 pending 预订, 发送确认邮件并记录发送时间
// 约束: 单项失败记数不中断批次; 时间戳仅在发送成功后写入 (幂等保护)
// ==========================================

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};

use crate::domain::reservation::Reservation;
use crate::domain::tenant::Tenant;
use crate::engine::error::EngineResult;
use crate::engine::settings_store::SettingsStore;
use crate::repository::{ReservationRepository, TenantRepository};
use crate::scheduler::mail::{MailMessage, MailSender};
use crate::scheduler::JobRunSummary;

/// 创建后静默期 (分钟): 早于该时长的 pending 预订才进入确认批次
pub const CONFIRMATION_MIN_AGE_MINUTES: i64 = 5;

// ==========================================
// ConfirmationJob - 确认邮件任务
// ==========================================

/// 确认邮件任务
pub struct ConfirmationJob {
    tenant_repo: Arc<TenantRepository>,
    settings_store: Arc<SettingsStore>,
    reservation_repo: Arc<ReservationRepository>,
    mail_sender: Arc<dyn MailSender>,
}

impl ConfirmationJob {
    pub fn new(
        tenant_repo: Arc<TenantRepository>,
        settings_store: Arc<SettingsStore>,
        reservation_repo: Arc<ReservationRepository>,
        mail_sender: Arc<dyn MailSender>,
    ) -> Self {
        Self {
            tenant_repo,
            settings_store,
            reservation_repo,
            mail_sender,
        }
    }

    /// 执行一轮扫描
    ///
    /// # 失败隔离
    /// - 租户枚举失败 → 本轮中止 (下一个 tick 即重试)
    /// - 租户级失败 → 仅跳过该租户剩余项
    /// - 单项失败 → 记数并继续
    pub async fn run_once(&self, now: NaiveDateTime) -> EngineResult<JobRunSummary> {
        let tenants = self.tenant_repo.list_with_reservations_enabled()?;
        let mut summary = JobRunSummary {
            tenants: tenants.len(),
            ..JobRunSummary::default()
        };

        for tenant in &tenants {
            if let Err(e) = self.run_tenant(tenant, now, &mut summary).await {
                tracing::error!(
                    tenant_id = %tenant.id,
                    error = %e,
                    "确认任务租户级失败, 跳过该租户剩余项"
                );
            }
        }

        tracing::info!(
            tenants = summary.tenants,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "确认任务一轮完成"
        );
        Ok(summary)
    }

    async fn run_tenant(
        &self,
        tenant: &Tenant,
        now: NaiveDateTime,
        summary: &mut JobRunSummary,
    ) -> EngineResult<()> {
        let settings = self.settings_store.get(&tenant.id)?;
        if !settings.send_confirmation_email {
            return Ok(());
        }

        let created_before = now - Duration::minutes(CONFIRMATION_MIN_AGE_MINUTES);
        let pending = self
            .reservation_repo
            .find_pending_confirmations(&tenant.id, created_before)?;

        for reservation in pending {
            summary.processed += 1;
            let message = Self::build_message(&reservation);
            match self.mail_sender.send(&message).await {
                Ok(()) => {
                    match self
                        .reservation_repo
                        .stamp_confirmation_sent(&tenant.id, &reservation.id, now)
                    {
                        Ok(()) => summary.succeeded += 1,
                        Err(e) => {
                            summary.failed += 1;
                            tracing::warn!(
                                tenant_id = %tenant.id,
                                reservation_number = %reservation.reservation_number,
                                error = %e,
                                "确认发送成功但时间戳写入失败"
                            );
                        }
                    }
                }
                Err(e) => {
                    // 投递失败非致命: 不写时间戳, 下一轮重试
                    summary.failed += 1;
                    tracing::warn!(
                        tenant_id = %tenant.id,
                        reservation_number = %reservation.reservation_number,
                        error = %e,
                        "确认邮件发送失败"
                    );
                }
            }
        }
        Ok(())
    }

    fn build_message(reservation: &Reservation) -> MailMessage {
        MailMessage {
            to: reservation.guest_email.clone().unwrap_or_default(),
            subject: format!(
                "Reservation {} confirmation",
                reservation.reservation_number
            ),
            html: format!(
                "<p>Dear {}, your reservation for {} guests on {} at {} is pending confirmation.</p>",
                reservation.guest_name,
                reservation.party_size,
                reservation.date,
                reservation.time.format("%H:%M"),
            ),
            tenant_id: reservation.tenant_id.clone(),
        }
    }
}
