// ==========================================
// 生产订单排产系统 - 配置层
// ==========================================
// 职责: 求解器行为配置 (超限/缺料处置策略与阈值)
// ==========================================

pub mod scheduler_config;

pub use scheduler_config::SchedulerConfig;
