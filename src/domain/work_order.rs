// ==========================================
// 生产订单排产系统 - 工单与工作中心领域模型
// ==========================================
// 红线: 工单由生产订单模块创建,对排产引擎只读,引擎绝不回写
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::WorkOrderStatus;

// ==========================================
// WorkOrder - 工单
// ==========================================
// 排产的原子单元: 不拆分到工序粒度 (工序数仅作参考信息)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,                          // 工单号 (唯一)
    pub product_code: String,                // 产品编码
    pub product_name: String,                // 产品名称
    pub quantity: u32,                       // 数量 (正整数)
    pub due_date: NaiveDate,                 // 交期
    pub status: WorkOrderStatus,             // 状态 (RELEASED/PLANNED)
    pub priority: u8,                        // 优先级 (1 = 最紧急)
    pub estimated_hours: f64,                // 加工工时 (正数)
    pub setup_time_hours: f64,               // 换产准备工时 (非负, 切换产品时计入)
    pub operation_count: u32,                // 工序数 (参考信息, 不单独排产)
    pub material_available: bool,            // 物料可用标志 (来自库存模块)
    pub work_center_id: String,              // 目标工作中心
    pub created_at: Option<NaiveDateTime>,   // 下达时间 (FIFO 依据, 缺失时退化为工单号序)
}

impl WorkOrder {
    /// 完整处理工时 = 加工工时 + 换产准备工时
    ///
    /// SPT 策略按该值升序排序
    pub fn processing_hours(&self) -> f64 {
        self.estimated_hours + self.setup_time_hours
    }
}

// ==========================================
// WorkCenter - 工作中心
// ==========================================
// 由资源模块维护; 引擎只读周期产能,已分配工时由 CapacityTracker
// 在单次求解内推导,绝不落回主数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: String,                    // 工作中心代码
    pub capacity_hours_per_period: f64, // 单周期产能 (小时)
}
