// ==========================================
// 多租户餐厅预订系统 - 领域类型定义
// ==========================================
// 职责: 预订/餐桌状态机的枚举类型
// 序列化格式: kebab-case 小写 (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 预订状态 (Reservation Status)
// ==========================================
// 终态: cancelled / completed / no-show
// 活跃态 (计入时段容量): pending / confirmed / seated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatus {
    Pending,   // 待确认
    Confirmed, // 已确认
    Seated,    // 已入座
    Completed, // 已完成
    Cancelled, // 已取消
    NoShow,    // 未到店
}

impl ReservationStatus {
    /// 数据库存储字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Seated => "seated",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no-show",
        }
    }

    /// 从数据库字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "seated" => Some(ReservationStatus::Seated),
            "completed" => Some(ReservationStatus::Completed),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "no-show" => Some(ReservationStatus::NoShow),
            _ => None,
        }
    }

    /// 是否为终态 (终态不允许任何转换)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled
                | ReservationStatus::Completed
                | ReservationStatus::NoShow
        )
    }

    /// 是否为活跃态 (占用时段容量)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending
                | ReservationStatus::Confirmed
                | ReservationStatus::Seated
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 预订动作 (Reservation Action)
// ==========================================
// 状态转换表的输入维度之一 (状态 × 动作 → 新状态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationAction {
    Confirm,    // 确认
    Seat,       // 入座
    Cancel,     // 取消
    MarkNoShow, // 标记未到店
    Complete,   // 完成
    Update,     // 修改日期/时间/人数
}

impl fmt::Display for ReservationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationAction::Confirm => write!(f, "confirm"),
            ReservationAction::Seat => write!(f, "seat"),
            ReservationAction::Cancel => write!(f, "cancel"),
            ReservationAction::MarkNoShow => write!(f, "mark-no-show"),
            ReservationAction::Complete => write!(f, "complete"),
            ReservationAction::Update => write!(f, "update"),
        }
    }
}

// ==========================================
// 餐桌状态 (Table Status)
// ==========================================
// 仅由预订生命周期副作用改变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableStatus {
    Available, // 空闲
    Reserved,  // 已预留
    Occupied,  // 使用中
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Reserved => "reserved",
            TableStatus::Occupied => "occupied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(TableStatus::Available),
            "reserved" => Some(TableStatus::Reserved),
            "occupied" => Some(TableStatus::Occupied),
            _ => None,
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 预订渠道 (Reservation Channel)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationChannel {
    Phone,  // 电话
    WalkIn, // 到店
    Online, // 官网
    App,    // 移动端
}

impl ReservationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationChannel::Phone => "phone",
            ReservationChannel::WalkIn => "walk-in",
            ReservationChannel::Online => "online",
            ReservationChannel::App => "app",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "phone" => Some(ReservationChannel::Phone),
            "walk-in" => Some(ReservationChannel::WalkIn),
            "online" => Some(ReservationChannel::Online),
            "app" => Some(ReservationChannel::App),
            _ => None,
        }
    }
}

impl fmt::Display for ReservationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
