// ==========================================
// 生产订单排产系统 - 领域类型定义
// ==========================================
// 红线: 约束违规是数据,不是异常
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 只有 RELEASED / PLANNED 两种状态的工单可进入排产候选集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Released, // 已下达
    Planned,  // 已计划
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkOrderStatus::Released => write!(f, "RELEASED"),
            WorkOrderStatus::Planned => write!(f, "PLANNED"),
        }
    }
}

// ==========================================
// 排产方案状态 (Schedule Status)
// ==========================================
// 红线: PUBLISHED 为终态,不可再编辑,只能创建新方案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Draft,     // 草稿 (可重算/可覆盖)
    Published, // 已发布 (终态)
}

impl ScheduleStatus {
    /// 数据库存储格式 (与 schedule.status 列一致)
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Draft => "DRAFT",
            ScheduleStatus::Published => "PUBLISHED",
        }
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(ScheduleStatus::Draft),
            "PUBLISHED" => Some(ScheduleStatus::Published),
            _ => None,
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 物料可用性状态 (Material Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialStatus {
    Available, // 库存充足
    Partial,   // 部分缺口
    Shortage,  // 严重缺料
}

impl fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialStatus::Available => write!(f, "available"),
            MaterialStatus::Partial => write!(f, "partial"),
            MaterialStatus::Shortage => write!(f, "shortage"),
        }
    }
}

// ==========================================
// 冲突类型 (Conflict Kind)
// ==========================================
// 对应三类非致命约束违规
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    CapacityExceeded, // 产能超限
    MaterialShortage, // 物料缺口
    DueDateMiss,      // 交期错过
}

impl ConflictKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConflictKind::CapacityExceeded => "CAPACITY_EXCEEDED",
            ConflictKind::MaterialShortage => "MATERIAL_SHORTAGE",
            ConflictKind::DueDateMiss => "DUE_DATE_MISS",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "CAPACITY_EXCEEDED" => Some(ConflictKind::CapacityExceeded),
            "MATERIAL_SHORTAGE" => Some(ConflictKind::MaterialShortage),
            "DUE_DATE_MISS" => Some(ConflictKind::DueDateMiss),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 冲突严重度 (Conflict Severity)
// ==========================================
// 红线: 只有 BLOCKING 冲突阻断发布; 被禁用约束产生的冲突一律 INFO
// Ord 用于冲突报告的确定性排序 (Blocking > Warning > Info)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Info,     // 信息提示 (约束被禁用时仍然上报)
    Warning,  // 警告 (不阻断发布)
    Blocking, // 阻断 (发布需显式 override)
}

impl ConflictSeverity {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Info => "INFO",
            ConflictSeverity::Warning => "WARNING",
            ConflictSeverity::Blocking => "BLOCKING",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "INFO" => Some(ConflictSeverity::Info),
            "WARNING" => Some(ConflictSeverity::Warning),
            "BLOCKING" => Some(ConflictSeverity::Blocking),
            _ => None,
        }
    }
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 超限策略 (Overload Policy)
// ==========================================
// 产能约束触发时的处置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverloadPolicy {
    /// 继续落位并标记超限 (默认: 每个选中的工单都要在方案中有落位)
    PlaceAndFlag,
    /// 推迟到溢出清单,不落位
    Defer,
}

impl Default for OverloadPolicy {
    fn default() -> Self {
        OverloadPolicy::PlaceAndFlag
    }
}

// ==========================================
// 缺料策略 (Shortage Policy)
// ==========================================
// 物料约束触发时的处置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortagePolicy {
    /// 照常落位,带阻断冲突 (默认)
    PlanAnyway,
    /// 跳过,留在未排产清单
    Skip,
}

impl Default for ShortagePolicy {
    fn default() -> Self {
        ShortagePolicy::PlanAnyway
    }
}

// ==========================================
// 测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_status_db_roundtrip() {
        assert_eq!(ScheduleStatus::from_db_str("DRAFT"), Some(ScheduleStatus::Draft));
        assert_eq!(
            ScheduleStatus::from_db_str(ScheduleStatus::Published.to_db_str()),
            Some(ScheduleStatus::Published)
        );
        assert_eq!(ScheduleStatus::from_db_str("ACTIVE"), None);
    }

    #[test]
    fn test_severity_ordering() {
        // 排序依赖: Blocking 最大
        assert!(ConflictSeverity::Blocking > ConflictSeverity::Warning);
        assert!(ConflictSeverity::Warning > ConflictSeverity::Info);
    }
}
