// ==========================================
// 多租户餐厅预订系统 - 租户领域模型
// ==========================================
// 职责: 调度任务筛选租户所需的功能开关
// 说明: 租户开通/认证不在本系统范围, 这里只读功能位
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Tenant - 租户
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,   // UUID
    pub name: String, // 租户名称

    // ===== 功能开关 =====
    pub reservations_enabled: bool, // 预订模块开关 (enabled_modules.reservations)
    pub is_active: bool,            // 停用租户对调度任务不可见
}
