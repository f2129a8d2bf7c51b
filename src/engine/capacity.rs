// ==========================================
// 生产订单排产系统 - 产能跟踪器
// ==========================================
// 职责: 单次求解内维护各工作中心的时间游标与累计分配工时
// 红线: 只作用于一次求解的快照,绝不回写工作中心主数据
// ==========================================

use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;

use crate::domain::schedule::{SchedulePeriod, WorkCenterUtilization};
use crate::domain::work_order::WorkCenter;
use crate::engine::error::{SchedulerError, SchedulerResult};

/// 一次成功分配得到的时间槽
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// 产能超限信号 (非致命: 由求解器按配置决定落位或推迟)
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityExceeded {
    pub work_center_id: String,
    pub capacity_hours: f64,
    pub allocated_hours: f64, // 当前累计 (不含被拒绝的这次)
    pub requested_hours: f64,
}

/// 分配结果
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationOutcome {
    Placed(TimeSlot),
    Refused(CapacityExceeded),
}

// 单个工作中心的求解内状态
#[derive(Debug, Clone)]
struct CenterState {
    capacity_hours: f64,
    allocated_hours: f64,
    cursor: NaiveDateTime,        // 下一可用时刻
    last_product: Option<String>, // 换产判定锚点
}

// ==========================================
// CapacityTracker - 产能跟踪器
// ==========================================
pub struct CapacityTracker {
    centers: HashMap<String, CenterState>,
}

impl CapacityTracker {
    /// 从快照构建: 每个工作中心的游标落在 period.start 当日的工作日起始整点
    pub fn new(work_centers: &[WorkCenter], period: &SchedulePeriod, work_day_start_hour: u32) -> Self {
        let start_time = chrono::NaiveTime::from_hms_opt(work_day_start_hour.min(23), 0, 0)
            .unwrap_or(chrono::NaiveTime::MIN);
        let origin = period.start.and_time(start_time);

        let centers = work_centers
            .iter()
            .map(|wc| {
                (
                    wc.id.clone(),
                    CenterState {
                        capacity_hours: wc.capacity_hours_per_period,
                        allocated_hours: 0.0,
                        cursor: origin,
                        last_product: None,
                    },
                )
            })
            .collect();

        Self { centers }
    }

    /// 尝试分配: 产能约束开启且累计将超出周期产能时拒绝
    ///
    /// 拒绝是信号而非错误 —— 游标与累计保持不变,由求解器决定后续处置。
    pub fn try_allocate(
        &mut self,
        work_center_id: &str,
        duration_hours: f64,
        enforce_capacity: bool,
    ) -> SchedulerResult<AllocationOutcome> {
        let state = self.center_mut(work_center_id)?;

        if enforce_capacity && state.allocated_hours + duration_hours > state.capacity_hours {
            return Ok(AllocationOutcome::Refused(CapacityExceeded {
                work_center_id: work_center_id.to_string(),
                capacity_hours: state.capacity_hours,
                allocated_hours: state.allocated_hours,
                requested_hours: duration_hours,
            }));
        }

        Ok(AllocationOutcome::Placed(Self::advance(state, duration_hours)))
    }

    /// 强制分配 (超限落位): 不检查产能,游标照常推进
    pub fn force_allocate(
        &mut self,
        work_center_id: &str,
        duration_hours: f64,
    ) -> SchedulerResult<TimeSlot> {
        let state = self.center_mut(work_center_id)?;
        Ok(Self::advance(state, duration_hours))
    }

    fn advance(state: &mut CenterState, duration_hours: f64) -> TimeSlot {
        let start = state.cursor;
        let end = start + Duration::minutes((duration_hours * 60.0).round() as i64);
        state.cursor = end;
        state.allocated_hours += duration_hours;
        TimeSlot { start, end }
    }

    /// 工作中心是否已注册
    pub fn contains(&self, work_center_id: &str) -> bool {
        self.centers.contains_key(work_center_id)
    }

    /// 上一个落位产品 (换产准备判定)
    pub fn last_product(&self, work_center_id: &str) -> Option<&str> {
        self.centers
            .get(work_center_id)
            .and_then(|s| s.last_product.as_deref())
    }

    /// 记录最近落位的产品
    pub fn record_product(&mut self, work_center_id: &str, product_code: &str) -> SchedulerResult<()> {
        let state = self.center_mut(work_center_id)?;
        state.last_product = Some(product_code.to_string());
        Ok(())
    }

    /// 全部工作中心的利用率 (按工作中心代码升序,保证输出确定性)
    pub fn utilization(&self) -> Vec<WorkCenterUtilization> {
        let mut rows: Vec<WorkCenterUtilization> = self
            .centers
            .iter()
            .map(|(id, s)| WorkCenterUtilization::compute(id, s.capacity_hours, s.allocated_hours))
            .collect();
        rows.sort_by(|a, b| a.work_center_id.cmp(&b.work_center_id));
        rows
    }

    fn center_mut(&mut self, work_center_id: &str) -> SchedulerResult<&mut CenterState> {
        self.centers
            .get_mut(work_center_id)
            .ok_or_else(|| SchedulerError::UnknownWorkCenter {
                work_center_id: work_center_id.to_string(),
                work_order_id: String::new(),
            })
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn period() -> SchedulePeriod {
        SchedulePeriod::new(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
        )
    }

    fn tracker(capacity: f64) -> CapacityTracker {
        CapacityTracker::new(
            &[WorkCenter {
                id: "CNC-01".to_string(),
                capacity_hours_per_period: capacity,
            }],
            &period(),
            8,
        )
    }

    #[test]
    fn test_cursor_starts_at_work_day_start() {
        let mut t = tracker(24.0);
        let outcome = t.try_allocate("CNC-01", 8.0, true).unwrap();
        let AllocationOutcome::Placed(slot) = outcome else {
            panic!("应当成功分配");
        };
        assert_eq!(
            slot.start,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(
            slot.end,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_sequential_slots_do_not_overlap() {
        let mut t = tracker(100.0);
        let mut prev_end: Option<NaiveDateTime> = None;
        for hours in [8.0, 12.0, 6.5] {
            let AllocationOutcome::Placed(slot) = t.try_allocate("CNC-01", hours, true).unwrap()
            else {
                panic!("应当成功分配");
            };
            if let Some(prev) = prev_end {
                assert_eq!(slot.start, prev, "游标必须紧接前一条目");
            }
            assert!(slot.end > slot.start);
            prev_end = Some(slot.end);
        }
    }

    #[test]
    fn test_refuse_when_capacity_enforced() {
        let mut t = tracker(24.0);
        assert!(matches!(
            t.try_allocate("CNC-01", 20.0, true).unwrap(),
            AllocationOutcome::Placed(_)
        ));
        // 20 + 12 > 24 => 拒绝,状态不变
        let AllocationOutcome::Refused(signal) = t.try_allocate("CNC-01", 12.0, true).unwrap()
        else {
            panic!("应当拒绝");
        };
        assert_eq!(signal.allocated_hours, 20.0);
        assert_eq!(signal.requested_hours, 12.0);
        assert_eq!(signal.capacity_hours, 24.0);
        // 拒绝不推进游标
        let u = t.utilization();
        assert_eq!(u[0].allocated_hours, 20.0);
    }

    #[test]
    fn test_no_refusal_when_not_enforced() {
        let mut t = tracker(24.0);
        assert!(matches!(
            t.try_allocate("CNC-01", 30.0, false).unwrap(),
            AllocationOutcome::Placed(_)
        ));
        assert!(t.utilization()[0].is_over_capacity());
    }

    #[test]
    fn test_force_allocate_over_capacity() {
        let mut t = tracker(24.0);
        let _ = t.try_allocate("CNC-01", 20.0, true).unwrap();
        let slot = t.force_allocate("CNC-01", 12.0).unwrap();
        assert!(slot.end > slot.start);
        let u = t.utilization();
        assert_eq!(u[0].allocated_hours, 32.0);
        assert!(u[0].is_over_capacity());
    }

    #[test]
    fn test_unknown_work_center_is_fatal() {
        let mut t = tracker(24.0);
        assert!(matches!(
            t.try_allocate("MILL-09", 1.0, true),
            Err(SchedulerError::UnknownWorkCenter { .. })
        ));
    }

    #[test]
    fn test_last_product_tracking() {
        let mut t = tracker(24.0);
        assert_eq!(t.last_product("CNC-01"), None);
        t.record_product("CNC-01", "PRD-BB-6205").unwrap();
        assert_eq!(t.last_product("CNC-01"), Some("PRD-BB-6205"));
    }

    #[test]
    fn test_utilization_sorted_and_rounded() {
        let mut t = CapacityTracker::new(
            &[
                WorkCenter { id: "CNC-02".to_string(), capacity_hours_per_period: 168.0 },
                WorkCenter { id: "CNC-01".to_string(), capacity_hours_per_period: 168.0 },
            ],
            &period(),
            8,
        );
        t.force_allocate("CNC-01", 131.0).unwrap();
        let rows = t.utilization();
        assert_eq!(rows[0].work_center_id, "CNC-01");
        assert_eq!(rows[0].utilization_percent, 78); // 131/168 -> 78%
        assert_eq!(rows[1].work_center_id, "CNC-02");
        assert_eq!(rows[1].utilization_percent, 0);
    }
}
