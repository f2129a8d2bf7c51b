// ==========================================
// 生产订单排产系统 - 排产约束模型
// ==========================================
// 红线: 禁用约束只是不再阻断落位,信息性冲突仍要上报
// 约束集是封闭的按名查询映射,求解器内部按 id 查询开关
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// ConstraintId - 约束标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintId {
    WorkCenterCapacity,  // 工作中心产能
    MaterialAvailability, // 物料可用性
    DueDates,            // 交期
    OperationSequence,   // 工序顺序
    SetupTime,           // 换产准备时间
}

impl ConstraintId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintId::WorkCenterCapacity => "work_center_capacity",
            ConstraintId::MaterialAvailability => "material_availability",
            ConstraintId::DueDates => "due_dates",
            ConstraintId::OperationSequence => "operation_sequence",
            ConstraintId::SetupTime => "setup_time",
        }
    }

    /// 约束默认说明 (与排产配置界面一致)
    pub fn description(&self) -> &'static str {
        match self {
            ConstraintId::WorkCenterCapacity => "Must respect work center capacity limits",
            ConstraintId::MaterialAvailability => "Schedule only if materials are available",
            ConstraintId::DueDates => "Must meet customer due dates",
            ConstraintId::OperationSequence => "Follow routing operation sequence",
            ConstraintId::SetupTime => "Include setup time between different jobs",
        }
    }

    /// 全部已知约束 (固定顺序)
    pub fn all() -> [ConstraintId; 5] {
        [
            ConstraintId::WorkCenterCapacity,
            ConstraintId::MaterialAvailability,
            ConstraintId::DueDates,
            ConstraintId::OperationSequence,
            ConstraintId::SetupTime,
        ]
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConstraintId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "work_center_capacity" => Ok(ConstraintId::WorkCenterCapacity),
            "material_availability" => Ok(ConstraintId::MaterialAvailability),
            "due_dates" => Ok(ConstraintId::DueDates),
            "operation_sequence" => Ok(ConstraintId::OperationSequence),
            "setup_time" => Ok(ConstraintId::SetupTime),
            other => Err(format!("未知约束: {}", other)),
        }
    }
}

// ==========================================
// Constraint - 约束项
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,    // 约束标识
    pub enabled: bool,       // 是否参与落位检查
    pub description: String, // 说明
}

// ==========================================
// ConstraintSet - 可切换约束集
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    /// 全部约束开启 (默认)
    pub fn all_enabled() -> Self {
        Self {
            constraints: ConstraintId::all()
                .into_iter()
                .map(|id| Constraint {
                    id,
                    enabled: true,
                    description: id.description().to_string(),
                })
                .collect(),
        }
    }

    /// 按 id 查询是否参与落位检查 (未注册的约束视为关闭)
    pub fn is_enabled(&self, id: ConstraintId) -> bool {
        self.constraints
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.enabled)
            .unwrap_or(false)
    }

    /// 开关单个约束
    pub fn set_enabled(&mut self, id: ConstraintId, enabled: bool) {
        if let Some(c) = self.constraints.iter_mut().find(|c| c.id == id) {
            c.enabled = enabled;
        }
    }

    /// 链式关闭 (测试/试算场景)
    pub fn with_disabled(mut self, id: ConstraintId) -> Self {
        self.set_enabled(id, false);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self::all_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_enabled_by_default() {
        let set = ConstraintSet::default();
        for id in ConstraintId::all() {
            assert!(set.is_enabled(id), "约束 {} 默认应开启", id);
        }
    }

    #[test]
    fn test_toggle_is_independent() {
        let mut set = ConstraintSet::all_enabled();
        set.set_enabled(ConstraintId::DueDates, false);
        assert!(!set.is_enabled(ConstraintId::DueDates));
        assert!(set.is_enabled(ConstraintId::WorkCenterCapacity));
        assert!(set.is_enabled(ConstraintId::SetupTime));
    }

    #[test]
    fn test_constraint_id_from_str() {
        assert_eq!(
            "work_center_capacity".parse::<ConstraintId>().unwrap(),
            ConstraintId::WorkCenterCapacity
        );
        assert_eq!(
            "SETUP_TIME".to_lowercase().parse::<ConstraintId>().unwrap(),
            ConstraintId::SetupTime
        );
        assert!("no_such_rule".parse::<ConstraintId>().is_err());
    }
}
