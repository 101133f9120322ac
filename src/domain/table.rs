// ==========================================
// 多租户餐厅预订系统 - 餐桌领域模型
// ==========================================
// 对齐: dining_table 表
// 红线: 餐桌状态仅由预订生命周期副作用改变
// ==========================================

use crate::domain::types::TableStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// DiningTable - 餐桌
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    // ===== 主键与归属 =====
    pub id: String,        // UUID
    pub tenant_id: String, // 租户ID

    // ===== 展示信息 =====
    pub table_number: String, // 桌号
    pub section: String,      // 区域 (如 "main", "terrace")

    // ===== 容量范围 =====
    pub min_capacity: i32, // 最小可坐人数
    pub max_capacity: i32, // 最大可坐人数

    // ===== 状态 =====
    pub status: TableStatus,
    pub is_active: bool, // 停用的餐桌对可用性检查与分配均不可见

    // ===== 入座信息 (入座时写入) =====
    pub guest_count: Option<i32>,
    pub seated_at: Option<NaiveDateTime>,
}

impl DiningTable {
    /// 容量是否覆盖指定人数
    pub fn fits(&self, party_size: i32) -> bool {
        self.min_capacity <= party_size && party_size <= self.max_capacity
    }

    /// 是否可被分配或入座 (available / reserved)
    pub fn is_seatable(&self) -> bool {
        matches!(self.status, TableStatus::Available | TableStatus::Reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(min: i32, max: i32, status: TableStatus) -> DiningTable {
        DiningTable {
            id: "T1".to_string(),
            tenant_id: "TEN1".to_string(),
            table_number: "12".to_string(),
            section: "main".to_string(),
            min_capacity: min,
            max_capacity: max,
            status,
            is_active: true,
            guest_count: None,
            seated_at: None,
        }
    }

    #[test]
    fn test_fits_boundaries() {
        let t = table(2, 4, TableStatus::Available);
        assert!(!t.fits(1));
        assert!(t.fits(2));
        assert!(t.fits(4));
        assert!(!t.fits(5));
    }

    #[test]
    fn test_is_seatable() {
        assert!(table(2, 4, TableStatus::Available).is_seatable());
        assert!(table(2, 4, TableStatus::Reserved).is_seatable());
        assert!(!table(2, 4, TableStatus::Occupied).is_seatable());
    }
}
