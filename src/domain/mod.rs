// ==========================================
// 生产订单排产系统 - 领域层
// ==========================================
// 职责: 实体与类型定义,不含业务规则
// ==========================================

pub mod constraint;
pub mod material;
pub mod schedule;
pub mod types;
pub mod work_order;

// 重导出核心实体
pub use constraint::{Constraint, ConstraintId, ConstraintSet};
pub use material::{BomLine, InventoryLevel, MaterialRequirement};
pub use schedule::{Schedule, ScheduleEntry, SchedulePeriod, WorkCenterUtilization};
pub use types::{
    ConflictKind, ConflictSeverity, MaterialStatus, OverloadPolicy, ScheduleStatus,
    ShortagePolicy, WorkOrderStatus,
};
pub use work_order::{WorkCenter, WorkOrder};
