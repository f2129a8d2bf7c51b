// ==========================================
// 生产订单排产系统 - 引擎层
// ==========================================
// 职责: 排产求解的全部业务规则
// 红线: 引擎只读快照,绝不直接触碰外部模块的数据
// 红线: 约束违规是冲突数据,不是错误
// ==========================================

pub mod capacity;
pub mod conflict;
pub mod error;
pub mod material;
pub mod policy;
pub mod scheduler;
pub mod service;
pub mod snapshot;

// 重导出核心类型
pub use capacity::{AllocationOutcome, CapacityTracker, TimeSlot};
pub use conflict::{Conflict, ConflictReport};
pub use error::{SchedulerError, SchedulerResult};
pub use material::{MaterialAvailabilityChecker, MaterialProjection};
pub use policy::{OrderComparator, SequencingPolicy};
pub use scheduler::{CancelFlag, Scheduler, SolveOutcome, SolveOutput, UnscheduledOrder};
pub use service::SchedulingService;
pub use snapshot::{
    BomSource, InMemoryPlanningData, InventorySource, PlanningSnapshot, SnapshotSources,
    WorkCenterRegistry, WorkOrderSource,
};
