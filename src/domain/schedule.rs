// ==========================================
// 生产订单排产系统 - 排产方案领域模型
// ==========================================
// 红线: 方案条目只是快照,不可反向污染工单主数据
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::ScheduleStatus;

// ==========================================
// SchedulePeriod - 排产周期
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub start: NaiveDate, // 周期起始日
    pub end: NaiveDate,   // 周期结束日 (含)
}

impl SchedulePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 周期是否有效 (start <= end)
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// 本周 (周一至周日)
    pub fn this_week(today: NaiveDate) -> Self {
        let weekday = today.weekday().num_days_from_monday() as i64;
        let start = today - Duration::days(weekday);
        Self { start, end: start + Duration::days(6) }
    }

    /// 下周 (周一至周日)
    pub fn next_week(today: NaiveDate) -> Self {
        let this = Self::this_week(today);
        Self {
            start: this.start + Duration::days(7),
            end: this.end + Duration::days(7),
        }
    }

    /// 本月 (1日至月末)
    pub fn this_month(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        let next_month_first = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next_month_first
            .map(|d| d - Duration::days(1))
            .unwrap_or(today);
        Self { start, end }
    }
}

// ==========================================
// ScheduleEntry - 排产条目
// ==========================================
// 不变式: 同一工作中心内条目互不重叠,按 start 升序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub work_order_id: String,    // 工单号
    pub work_center_id: String,   // 工作中心
    pub start: NaiveDateTime,     // 开始时刻
    pub end: NaiveDateTime,       // 结束时刻 (end - start = duration_hours)
    pub duration_hours: f64,      // 占用工时 (加工 + 插入的换产准备)
    pub setup_hours: f64,         // 其中换产准备工时 (可解释性)
    pub seq_no: i32,              // 工作中心内序号
}

// ==========================================
// Schedule - 排产方案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,                 // 方案ID (SCH- 前缀)
    pub period: SchedulePeriod,     // 排产周期
    pub entries: Vec<ScheduleEntry>, // 条目 (落位顺序)
    pub status: ScheduleStatus,     // 状态 (DRAFT/PUBLISHED)
    pub version: i32,               // 乐观锁版本号 (单调递增)
    pub created_at: NaiveDateTime,  // 创建时间
    pub updated_at: NaiveDateTime,  // 更新时间
}

impl Schedule {
    /// 判断是否为草稿状态
    pub fn is_draft(&self) -> bool {
        self.status == ScheduleStatus::Draft
    }

    /// 判断是否已发布 (终态)
    pub fn is_published(&self) -> bool {
        self.status == ScheduleStatus::Published
    }

    /// 指定工作中心的条目 (保持落位顺序)
    pub fn entries_for(&self, work_center_id: &str) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.work_center_id == work_center_id)
            .collect()
    }
}

// ==========================================
// WorkCenterUtilization - 工作中心利用率
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenterUtilization {
    pub work_center_id: String,   // 工作中心
    pub capacity_hours: f64,      // 周期产能
    pub allocated_hours: f64,     // 已分配工时
    pub utilization_percent: i32, // 利用率 (四舍五入取整)
}

impl WorkCenterUtilization {
    /// 利用率 = allocated / capacity * 100, 四舍五入
    pub fn compute(work_center_id: &str, capacity_hours: f64, allocated_hours: f64) -> Self {
        let percent = if capacity_hours > 0.0 {
            (allocated_hours / capacity_hours * 100.0).round() as i32
        } else {
            0
        };
        Self {
            work_center_id: work_center_id.to_string(),
            capacity_hours,
            allocated_hours,
            utilization_percent: percent,
        }
    }

    /// 是否超限
    pub fn is_over_capacity(&self) -> bool {
        self.allocated_hours > self.capacity_hours
    }
}
