// ==========================================
// 生产订单排产系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("数据库连接锁获取失败: {0}")]
    LockError(String),

    // ===== 记录未找到 =====
    #[error("记录未找到: {entity} (id: {id})")]
    NotFound { entity: String, id: String },

    // ===== 并发控制 =====
    #[error("乐观锁冲突: 排产方案 {schedule_id} 期望版本 {expected}, 实际版本 {actual}")]
    OptimisticLockFailure {
        schedule_id: String,
        expected: i32,
        actual: i32,
    },

    // ===== 生命周期红线 =====
    #[error("非法状态变更: {from} -> {to} (排产方案 {schedule_id})")]
    InvalidStateTransition {
        schedule_id: String,
        from: String,
        to: String,
    },

    #[error("发布被阻断: 排产方案 {schedule_id} 存在 {blocking_count} 条阻断级冲突")]
    PublishBlocked {
        schedule_id: String,
        blocking_count: usize,
    },

    // ===== 数据完整性 =====
    #[error("数据损坏: {0}")]
    DataCorruption(String),
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
