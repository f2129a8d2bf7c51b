// ==========================================
// 生产订单排产系统 - 顺序策略引擎
// ==========================================
// 职责: 将候选工单集排成确定性的处理序列
// 红线: 封闭的策略变体集合,单一 match 分发,
//       不允许字符串分支静默落到默认策略
// 红线: 纯函数 + 全序 + 显式平局规则,同输入必同输出
// ==========================================

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::work_order::WorkOrder;

/// 自定义比较器 (调用方保证满足全序契约,引擎不透视其内部)
pub type OrderComparator = Arc<dyn Fn(&WorkOrder, &WorkOrder) -> Ordering + Send + Sync>;

// ==========================================
// SequencingPolicy - 顺序策略
// ==========================================
#[derive(Clone)]
pub enum SequencingPolicy {
    /// 优先级升序; 平局按交期升序,再按工单号升序
    Priority,
    /// 下达顺序 (created_at 升序,缺失时退化为工单号升序)
    Fifo,
    /// 最早交期优先; 平局按优先级升序,再按工单号
    Edd,
    /// 最短处理时间优先 (加工+换产); 平局按交期升序,再按工单号
    Spt,
    /// 调用方提供的比较器
    Custom(OrderComparator),
}

impl SequencingPolicy {
    /// 策略名 (与界面/配置中的字符串一致)
    pub fn as_str(&self) -> &'static str {
        match self {
            SequencingPolicy::Priority => "priority",
            SequencingPolicy::Fifo => "fifo",
            SequencingPolicy::Edd => "edd",
            SequencingPolicy::Spt => "spt",
            SequencingPolicy::Custom(_) => "custom",
        }
    }

    /// 将候选集排成处理序列
    ///
    /// 纯函数: 入参不被修改,输出为新的有序副本。
    /// 稳定排序 + 工单号兜底平局,保证幂等与可重放。
    pub fn order(&self, work_orders: &[WorkOrder]) -> Vec<WorkOrder> {
        let mut sorted: Vec<WorkOrder> = work_orders.to_vec();
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }

    /// 策略比较函数 (全序)
    pub fn compare(&self, a: &WorkOrder, b: &WorkOrder) -> Ordering {
        match self {
            SequencingPolicy::Priority => a
                .priority
                .cmp(&b.priority)
                .then_with(|| a.due_date.cmp(&b.due_date))
                .then_with(|| a.id.cmp(&b.id)),
            SequencingPolicy::Fifo => a
                .created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id)),
            SequencingPolicy::Edd => a
                .due_date
                .cmp(&b.due_date)
                .then_with(|| a.priority.cmp(&b.priority))
                .then_with(|| a.id.cmp(&b.id)),
            SequencingPolicy::Spt => a
                .processing_hours()
                .partial_cmp(&b.processing_hours())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.due_date.cmp(&b.due_date))
                .then_with(|| a.id.cmp(&b.id)),
            SequencingPolicy::Custom(cmp) => cmp(a, b),
        }
    }
}

impl fmt::Debug for SequencingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencingPolicy::Custom(_) => write!(f, "SequencingPolicy::Custom(..)"),
            other => write!(f, "SequencingPolicy::{}", other.as_str()),
        }
    }
}

impl Default for SequencingPolicy {
    fn default() -> Self {
        SequencingPolicy::Priority
    }
}

impl FromStr for SequencingPolicy {
    type Err = String;

    /// 解析界面传入的策略名; Custom 需要比较器,不可由字符串构造
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Ok(SequencingPolicy::Priority),
            "fifo" => Ok(SequencingPolicy::Fifo),
            "edd" => Ok(SequencingPolicy::Edd),
            "spt" => Ok(SequencingPolicy::Spt),
            other => Err(format!("未知顺序策略: {}", other)),
        }
    }
}
