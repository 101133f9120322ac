// ==========================================
// 多租户餐厅预订系统 - 租户策略存取 (SettingsStore)
// ==========================================
// 职责: 按租户键读写预订策略, 读缺失时以默认值落库 (upsert-on-read)
// 红线: 不做进程内缓存, 状态全部落在 reservation_settings 表
// ==========================================

use std::sync::Arc;

use crate::domain::settings::ReservationSettings;
use crate::engine::error::EngineResult;
use crate::repository::{RepositoryError, ReservationSettingsRepository};

// ==========================================
// SettingsStore - 按租户的策略存储
// ==========================================

/// 租户策略存储
pub struct SettingsStore {
    settings_repo: Arc<ReservationSettingsRepository>,
}

impl SettingsStore {
    pub fn new(settings_repo: Arc<ReservationSettingsRepository>) -> Self {
        Self { settings_repo }
    }

    /// 读取租户策略, 缺失时合成默认值并落库
    ///
    /// # 并发说明
    /// - 两个读缺失的调用可能同时尝试插入默认行;
    ///   后插入者命中唯一约束后回退为重读, 结果一致
    pub fn get(&self, tenant_id: &str) -> EngineResult<ReservationSettings> {
        if let Some(settings) = self.settings_repo.find_by_tenant(tenant_id)? {
            return Ok(settings);
        }

        let defaults = ReservationSettings::default_for(tenant_id);
        match self.settings_repo.insert(&defaults) {
            Ok(()) => {
                tracing::info!(tenant_id, "已为租户创建默认预订策略");
                Ok(defaults)
            }
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                // 并发创建竞争: 读已落库的那一行
                match self.settings_repo.find_by_tenant(tenant_id)? {
                    Some(settings) => Ok(settings),
                    None => Ok(defaults),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 更新租户策略 (缺失时先以默认值落库再覆盖)
    pub fn update(&self, settings: &ReservationSettings) -> EngineResult<ReservationSettings> {
        // 保证行存在 (读时缺省创建)
        let _ = self.get(&settings.tenant_id)?;
        self.settings_repo.update(settings)?;
        Ok(settings.clone())
    }
}
