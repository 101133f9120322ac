// ==========================================
// 多租户餐厅预订系统 - 餐桌分配引擎
// ==========================================
// 职责: 按人数在租户餐桌清单中做最优匹配 (best-fit)
// 规则: 取满足 min ≤ 人数 ≤ max 且空闲的餐桌中最大容量最小者
// ==========================================

use std::sync::Arc;

use crate::domain::table::DiningTable;
use crate::engine::error::EngineResult;
use crate::repository::TableRepository;

// ==========================================
// TableAllocator - 餐桌分配
// ==========================================

/// 餐桌分配引擎
pub struct TableAllocator {
    table_repo: Arc<TableRepository>,
}

impl TableAllocator {
    pub fn new(table_repo: Arc<TableRepository>) -> Self {
        Self { table_repo }
    }

    /// 为指定人数分配最紧致的空闲餐桌
    ///
    /// # 返回
    /// - Ok(Some): 命中的餐桌 (不在此处改状态, 由生命周期落库)
    /// - Ok(None): 无可分配餐桌, 预订可先不带桌创建, 入座时显式指定重试
    pub fn allocate(
        &self,
        tenant_id: &str,
        party_size: i32,
    ) -> EngineResult<Option<DiningTable>> {
        let table = self.table_repo.find_best_fit(tenant_id, party_size)?;
        if let Some(t) = &table {
            tracing::debug!(
                tenant_id,
                table_number = %t.table_number,
                max_capacity = t.max_capacity,
                party_size,
                "best-fit 餐桌命中"
            );
        }
        Ok(table)
    }
}
