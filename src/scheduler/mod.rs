// ==========================================
// 多租户餐厅预订系统 - 通知调度层
// ==========================================
// 职责: 三个独立节拍的自治任务 (确认/提醒/未到店)
// 设计: 任务轮次间无内存状态, 状态全部落在持久化记录上
// 已知缺口: 多实例并发跑任务仅有时间戳幂等保护, 无分布式锁
// ==========================================

pub mod confirmation_job;
pub mod mail;
pub mod no_show_job;
pub mod reminder_job;

// 重导出核心类型
pub use confirmation_job::{ConfirmationJob, CONFIRMATION_MIN_AGE_MINUTES};
pub use mail::{LogMailSender, MailError, MailMessage, MailSender};
pub use no_show_job::NoShowJob;
pub use reminder_job::ReminderJob;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::engine::lifecycle::ReservationLifecycle;
use crate::engine::repositories::ReservationRepositories;
use crate::engine::settings_store::SettingsStore;

/// 确认任务节拍
pub const CONFIRMATION_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// 提醒任务节拍
pub const REMINDER_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// 未到店任务节拍
pub const NO_SHOW_INTERVAL: Duration = Duration::from_secs(30 * 60);

// ==========================================
// JobRunSummary - 单轮执行统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobRunSummary {
    /// 本轮枚举到的租户数
    pub tenants: usize,
    /// 进入处理的预订条数
    pub processed: usize,
    /// 处理成功条数
    pub succeeded: usize,
    /// 处理失败条数 (已记日志, 不中断批次)
    pub failed: usize,
}

// ==========================================
// NotificationScheduler - 任务装配与启动
// ==========================================

/// 通知调度器
pub struct NotificationScheduler {
    confirmation_job: Arc<ConfirmationJob>,
    reminder_job: Arc<ReminderJob>,
    no_show_job: Arc<NoShowJob>,
}

impl NotificationScheduler {
    /// 装配三个任务 (共享仓储与策略存储)
    pub fn new(
        repos: &ReservationRepositories,
        lifecycle: Arc<ReservationLifecycle>,
        mail_sender: Arc<dyn MailSender>,
    ) -> Self {
        let settings_store = Arc::new(SettingsStore::new(Arc::clone(&repos.settings_repo)));
        Self {
            confirmation_job: Arc::new(ConfirmationJob::new(
                Arc::clone(&repos.tenant_repo),
                Arc::clone(&settings_store),
                Arc::clone(&repos.reservation_repo),
                Arc::clone(&mail_sender),
            )),
            reminder_job: Arc::new(ReminderJob::new(
                Arc::clone(&repos.tenant_repo),
                Arc::clone(&settings_store),
                Arc::clone(&repos.reservation_repo),
                mail_sender,
            )),
            no_show_job: Arc::new(NoShowJob::new(
                Arc::clone(&repos.tenant_repo),
                settings_store,
                Arc::clone(&repos.reservation_repo),
                lifecycle,
            )),
        }
    }

    /// 启动三个独立节拍的循环任务
    ///
    /// # 说明
    /// - 单轮失败只记日志, 循环继续; 下一个 tick 即重试
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let confirmation_job = Arc::clone(&self.confirmation_job);
        let confirmation = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CONFIRMATION_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let now = Utc::now().naive_utc();
                if let Err(e) = confirmation_job.run_once(now).await {
                    tracing::error!(error = %e, "确认任务本轮中止");
                }
            }
        });

        let reminder_job = Arc::clone(&self.reminder_job);
        let reminder = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REMINDER_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let now = Utc::now().naive_utc();
                if let Err(e) = reminder_job.run_once(now).await {
                    tracing::error!(error = %e, "提醒任务本轮中止");
                }
            }
        });

        let no_show_job = Arc::clone(&self.no_show_job);
        let no_show = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(NO_SHOW_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let now = Utc::now().naive_utc();
                if let Err(e) = no_show_job.run_once(now) {
                    tracing::error!(error = %e, "未到店任务本轮中止");
                }
            }
        });

        vec![confirmation, reminder, no_show]
    }
}
