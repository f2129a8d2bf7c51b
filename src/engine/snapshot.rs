// ==========================================
// 生产订单排产系统 - 规划快照
// ==========================================
// 职责: 求解开始时一次性拉取工单/工作中心/BOM/库存,
//       单次求解全程只读这份快照 (快照隔离)
// 红线: 外部模块的数据通过只读 trait 进入,
//       不允许共享的模块级可变状态
// ==========================================

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::material::{BomLine, InventoryLevel};
use crate::domain::work_order::{WorkCenter, WorkOrder};
use crate::engine::error::{SchedulerError, SchedulerResult};

// ==========================================
// 外部协作方 trait (工单/资源/BOM/库存模块各自拥有数据)
// ==========================================

/// 工单下发源
#[async_trait]
pub trait WorkOrderSource: Send + Sync {
    /// 按工单号批量读取 (返回集可少于请求集,由快照层判定缺失)
    async fn fetch_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<WorkOrder>>;
}

/// 工作中心注册表
#[async_trait]
pub trait WorkCenterRegistry: Send + Sync {
    async fn fetch_all(&self) -> anyhow::Result<Vec<WorkCenter>>;
}

/// BOM 查询源 (产品 -> 物料消耗)
#[async_trait]
pub trait BomSource: Send + Sync {
    async fn fetch_all(&self) -> anyhow::Result<Vec<BomLine>>;
}

/// 库存水平源
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn fetch_levels(&self) -> anyhow::Result<Vec<InventoryLevel>>;
}

// ==========================================
// SnapshotSources - 协作方聚合
// ==========================================
// 将 4 个只读源合并为一个注入参数,便于测试 mock
#[derive(Clone)]
pub struct SnapshotSources {
    pub work_orders: Arc<dyn WorkOrderSource>,
    pub work_centers: Arc<dyn WorkCenterRegistry>,
    pub bom: Arc<dyn BomSource>,
    pub inventory: Arc<dyn InventorySource>,
}

// ==========================================
// PlanningSnapshot - 一次求解的只读快照
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanningSnapshot {
    pub work_orders: Vec<WorkOrder>,
    pub work_centers: Vec<WorkCenter>,
    pub bom_lines: Vec<BomLine>,
    pub inventory: Vec<InventoryLevel>,
    pub taken_at: NaiveDateTime,
}

impl PlanningSnapshot {
    /// 捕获快照
    ///
    /// 请求的工单号有缺失时立即返回 UnknownWorkOrder (致命),
    /// 不进入求解阶段。
    pub async fn capture(
        sources: &SnapshotSources,
        work_order_ids: &[String],
    ) -> SchedulerResult<Self> {
        let work_orders = sources.work_orders.fetch_by_ids(work_order_ids).await?;

        let fetched: HashSet<&str> = work_orders.iter().map(|wo| wo.id.as_str()).collect();
        for id in work_order_ids {
            if !fetched.contains(id.as_str()) {
                return Err(SchedulerError::UnknownWorkOrder(id.clone()));
            }
        }

        let work_centers = sources.work_centers.fetch_all().await?;
        let bom_lines = sources.bom.fetch_all().await?;
        let inventory = sources.inventory.fetch_levels().await?;

        Ok(Self {
            work_orders,
            work_centers,
            bom_lines,
            inventory,
            taken_at: Utc::now().naive_utc(),
        })
    }
}

// ==========================================
// InMemoryPlanningData - 内存实现
// ==========================================
// 用途: 测试与演示; 也是"可变 mock 数组"的结构化替代 ——
// 数据不可变地持有,快照读出,结构化结果返回
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanningData {
    pub work_orders: Vec<WorkOrder>,
    pub work_centers: Vec<WorkCenter>,
    pub bom_lines: Vec<BomLine>,
    pub inventory: Vec<InventoryLevel>,
}

impl InMemoryPlanningData {
    /// 打包为 SnapshotSources (同一份数据充当 4 个源)
    pub fn into_sources(self) -> SnapshotSources {
        let shared = Arc::new(self);
        SnapshotSources {
            work_orders: shared.clone(),
            work_centers: shared.clone(),
            bom: shared.clone(),
            inventory: shared,
        }
    }
}

#[async_trait]
impl WorkOrderSource for InMemoryPlanningData {
    async fn fetch_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<WorkOrder>> {
        let wanted: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        Ok(self
            .work_orders
            .iter()
            .filter(|wo| wanted.contains(wo.id.as_str()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WorkCenterRegistry for InMemoryPlanningData {
    async fn fetch_all(&self) -> anyhow::Result<Vec<WorkCenter>> {
        Ok(self.work_centers.clone())
    }
}

#[async_trait]
impl BomSource for InMemoryPlanningData {
    async fn fetch_all(&self) -> anyhow::Result<Vec<BomLine>> {
        Ok(self.bom_lines.clone())
    }
}

#[async_trait]
impl InventorySource for InMemoryPlanningData {
    async fn fetch_levels(&self) -> anyhow::Result<Vec<InventoryLevel>> {
        Ok(self.inventory.clone())
    }
}
