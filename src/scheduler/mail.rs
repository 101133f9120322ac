// ==========================================
// 多租户餐厅预订系统 - 邮件发送协作方
// ==========================================
// 职责: 对外部邮件服务的接口抽象 (投递与模板渲染不在本系统范围)
// 约束: 投递失败非致命, 调用方记日志并跳过时间戳
// ==========================================

use async_trait::async_trait;
use thiserror::Error;

/// 外发邮件
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub tenant_id: String,
}

/// 邮件发送错误
#[derive(Error, Debug)]
pub enum MailError {
    #[error("邮件发送失败: {0}")]
    SendFailed(String),
}

/// 邮件发送方 (外部协作方接口)
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

// ==========================================
// LogMailSender - 仅记日志的发送方
// ==========================================
// 用途: 本地运行与未接入邮件服务的部署
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        tracing::info!(
            tenant_id = %message.tenant_id,
            to = %message.to,
            subject = %message.subject,
            "邮件已记录 (未接入外部邮件服务)"
        );
        Ok(())
    }
}
