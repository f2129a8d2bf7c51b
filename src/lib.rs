// ==========================================
// 生产订单排产系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ConflictKind, ConflictSeverity, MaterialStatus, OverloadPolicy, ScheduleStatus,
    ShortagePolicy, WorkOrderStatus,
};

// 领域实体
pub use domain::{
    BomLine, Constraint, ConstraintId, ConstraintSet, InventoryLevel, MaterialRequirement,
    Schedule, ScheduleEntry, SchedulePeriod, WorkCenter, WorkCenterUtilization, WorkOrder,
};

// 引擎
pub use engine::{
    CancelFlag, Conflict, ConflictReport, PlanningSnapshot, Scheduler, SchedulerError,
    SchedulerResult, SchedulingService, SequencingPolicy, SolveOutcome, SolveOutput,
};

// 仓储
pub use repository::{RepositoryError, RepositoryResult, ScheduleRepository};

// 配置
pub use config::SchedulerConfig;

/// 应用版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用名称
pub const APP_NAME: &str = "生产订单排产系统";
