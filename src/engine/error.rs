// ==========================================
// 生产订单排产系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 致命错误用类型化 Result 返回;
//       产能/物料/交期违规是 ConflictReport 数据,绝不走错误通道
// ==========================================

use thiserror::Error;

use crate::repository::error::RepositoryError;

/// 引擎层错误类型 (全部为致命错误,求解在任何分配前中止)
#[derive(Error, Debug)]
pub enum SchedulerError {
    // ===== 校验错误 =====
    #[error("排产周期无效: start={start}, end={end}")]
    InvalidPeriod { start: String, end: String },

    #[error("候选工单集合为空")]
    EmptyCandidateSet,

    #[error("未知工作中心: {work_center_id} (工单 {work_order_id})")]
    UnknownWorkCenter {
        work_center_id: String,
        work_order_id: String,
    },

    #[error("未知工单: {0}")]
    UnknownWorkOrder(String),

    // ===== 互斥控制 =====
    #[error("排产方案正在求解/发布中: {0}")]
    SolveInProgress(String),

    // ===== 下层透传 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("外部数据源读取失败: {0}")]
    Source(#[from] anyhow::Error),
}

/// Result 类型别名
pub type SchedulerResult<T> = Result<T, SchedulerError>;
