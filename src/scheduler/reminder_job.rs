// ==========================================
// 多租户餐厅预订系统 - 提醒邮件调度任务
// ==========================================
// 职责: 周期扫描即将到店的 confirmed 预订, 发送提醒邮件
// 约束: 提醒窗口 [now, now + 租户提前量]; 时间戳仅在发送成功后写入
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

// ==========================================
// ReminderJob - 提醒邮件任务
// ==========================================

/// 提醒邮件任务
pub struct ReminderJob {
    tenant_repo: Arc<TenantRepository>,
    settings_store: Arc<SettingsStore>,
    reservation_repo: Arc<ReservationRepository>,
    mail_sender: Arc<dyn MailSender>,
}

impl ReminderJob {
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

    /// 执行一轮扫描 (失败隔离同确认任务)
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
                    "提醒任务租户级失败, 跳过该租户剩余项"
                );
            }
        }

        tracing::info!(
            tenants = summary.tenants,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "提醒任务一轮完成"
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
        if !settings.send_reminder_email {
            return Ok(());
        }

        let until = now + Duration::hours(settings.reminder_hours_before as i64);
        let upcoming = self
            .reservation_repo
            .find_pending_reminders(&tenant.id, now, until)?;

        for reservation in upcoming {
            summary.processed += 1;
            let message = Self::build_message(&reservation);
            match self.mail_sender.send(&message).await {
                Ok(()) => {
                    match self
                        .reservation_repo
                        .stamp_reminder_sent(&tenant.id, &reservation.id, now)
                    {
                        Ok(()) => summary.succeeded += 1,
                        Err(e) => {
                            summary.failed += 1;
                            tracing::warn!(
                                tenant_id = %tenant.id,
                                reservation_number = %reservation.reservation_number,
                                error = %e,
                                "提醒发送成功但时间戳写入失败"
                            );
                        }
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        tenant_id = %tenant.id,
                        reservation_number = %reservation.reservation_number,
                        error = %e,
                        "提醒邮件发送失败"
                    );
                }
            }
        }
        Ok(())
    }

    fn build_message(reservation: &Reservation) -> MailMessage {
        MailMessage {
            to: reservation.guest_email.clone().unwrap_or_default(),
            subject: format!("Reminder: reservation {}", reservation.reservation_number),
            html: format!(
                "<p>Dear {}, this is a reminder of your reservation for {} guests on {} at {}.</p>",
                reservation.guest_name,
                reservation.party_size,
                reservation.date,
                reservation.time.format("%H:%M"),
            ),
            tenant_id: reservation.tenant_id.clone(),
        }
    }
}
