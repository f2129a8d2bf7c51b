// ==========================================
// 生产订单排产系统 - 核心求解器
// ==========================================
// 算法: 单遍前向落位启发式,无回溯
// 红线: 致命校验在任何分配之前完成;
//       产能/物料/交期违规只进冲突报告,不中断求解
// 红线: 单线程确定性求解,取消只发生在工单边界,
//       取消的求解不产生任何输出
// ==========================================

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::domain::constraint::{ConstraintId, ConstraintSet};
use crate::domain::material::MaterialRequirement;
use crate::domain::schedule::{
    Schedule, ScheduleEntry, SchedulePeriod, WorkCenterUtilization,
};
use crate::domain::types::{
    ConflictKind, ConflictSeverity, MaterialStatus, OverloadPolicy, ScheduleStatus, ShortagePolicy,
};
use crate::engine::capacity::{AllocationOutcome, CapacityTracker};
use crate::engine::conflict::{Conflict, ConflictReport};
use crate::engine::error::{SchedulerError, SchedulerResult};
use crate::engine::material::MaterialAvailabilityChecker;
use crate::engine::policy::SequencingPolicy;
use crate::engine::snapshot::PlanningSnapshot;

// ==========================================
// CancelFlag - 协作式取消
// ==========================================
// 调用方置位后,求解在下一个工单边界退出,不产生部分结果
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

// ==========================================
// 求解输出
// ==========================================

/// 未落位工单 (跳过或推迟),reason 为结构化原因码前缀的说明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnscheduledOrder {
    pub work_order_id: String,
    pub work_center_id: String,
    pub reason: String,
}

/// 一次完整求解的全部产出
#[derive(Debug, Clone)]
pub struct SolveOutput {
    pub schedule: Schedule,
    pub conflicts: ConflictReport,
    pub utilization: Vec<WorkCenterUtilization>,
    pub material_requirements: Vec<MaterialRequirement>,
    pub unscheduled: Vec<UnscheduledOrder>,
}

/// 可取消求解的结果
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Completed(Box<SolveOutput>),
    Cancelled,
}

// ==========================================
// Scheduler - 核心求解器
// ==========================================
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// 执行一次排产求解 (不可取消入口)
    pub fn generate(
        &self,
        snapshot: &PlanningSnapshot,
        period: &SchedulePeriod,
        constraints: &ConstraintSet,
        policy: &SequencingPolicy,
    ) -> SchedulerResult<SolveOutput> {
        match self.generate_cancellable(snapshot, period, constraints, policy, &CancelFlag::new())? {
            SolveOutcome::Completed(output) => Ok(*output),
            // 新建的 CancelFlag 不可能被置位
            SolveOutcome::Cancelled => {
                Err(SchedulerError::Source(anyhow::anyhow!("未共享的取消标志被置位")))
            }
        }
    }

    /// 执行一次排产求解,支持工单边界处的协作式取消
    #[instrument(skip_all, fields(
        period_start = %period.start,
        period_end = %period.end,
        candidates = snapshot.work_orders.len(),
        policy = policy.as_str(),
    ))]
    pub fn generate_cancellable(
        &self,
        snapshot: &PlanningSnapshot,
        period: &SchedulePeriod,
        constraints: &ConstraintSet,
        policy: &SequencingPolicy,
        cancel: &CancelFlag,
    ) -> SchedulerResult<SolveOutcome> {
        // ==========================================
        // 步骤1: 致命校验 (任何分配之前)
        // ==========================================
        self.validate(snapshot, period)?;

        let mut tracker =
            CapacityTracker::new(&snapshot.work_centers, period, self.config.work_day_start_hour);

        // ==========================================
        // 步骤2: 物料需求投影 (整个候选集聚合)
        // ==========================================
        let checker = MaterialAvailabilityChecker::new(
            &snapshot.bom_lines,
            &snapshot.inventory,
            self.config.shortage_threshold_ratio,
        );
        let projection = checker.project(&snapshot.work_orders);
        debug!(materials = projection.requirements().len(), "物料需求投影完成");

        // ==========================================
        // 步骤3: 顺序策略排序
        // ==========================================
        let ordered = policy.order(&snapshot.work_orders);
        debug!(ordered = ordered.len(), "顺序策略排序完成");

        // ==========================================
        // 步骤4: 逐工单前向落位
        // ==========================================
        let capacity_enabled = constraints.is_enabled(ConstraintId::WorkCenterCapacity);
        let material_enabled = constraints.is_enabled(ConstraintId::MaterialAvailability);
        let due_dates_enabled = constraints.is_enabled(ConstraintId::DueDates);
        let setup_enabled = constraints.is_enabled(ConstraintId::SetupTime);

        let mut entries: Vec<ScheduleEntry> = Vec::with_capacity(ordered.len());
        let mut conflicts = ConflictReport::new();
        let mut unscheduled: Vec<UnscheduledOrder> = Vec::new();
        let mut seq_by_center: HashMap<String, i32> = HashMap::new();

        for wo in &ordered {
            // 取消只发生在工单边界,保证无部分条目泄漏
            if cancel.is_cancelled() {
                info!("求解在工单边界被取消,丢弃全部中间结果");
                return Ok(SolveOutcome::Cancelled);
            }

            // 4a. 物料门控
            let material_status = checker.status_for(&projection, wo);
            if material_status == MaterialStatus::Shortage {
                if material_enabled && self.config.shortage_policy == ShortagePolicy::Skip {
                    conflicts.add(Conflict {
                        kind: ConflictKind::MaterialShortage,
                        subject: wo.id.clone(),
                        severity: ConflictSeverity::Warning,
                        message: format!(
                            "{}: material shortage for product {}; left unscheduled",
                            wo.id, wo.product_code
                        ),
                    });
                    unscheduled.push(UnscheduledOrder {
                        work_order_id: wo.id.clone(),
                        work_center_id: wo.work_center_id.clone(),
                        reason: format!("MATERIAL_SHORTAGE: product {} short on material", wo.product_code),
                    });
                    continue;
                }
                // 照常落位: 约束开启 => 阻断冲突; 关闭 => 信息性冲突
                conflicts.add(Conflict {
                    kind: ConflictKind::MaterialShortage,
                    subject: wo.id.clone(),
                    severity: if material_enabled {
                        ConflictSeverity::Blocking
                    } else {
                        ConflictSeverity::Info
                    },
                    message: format!(
                        "{}: material not available for product {}",
                        wo.id, wo.product_code
                    ),
                });
            }

            // 4b. 换产准备工时 (仅当紧邻的前一个产品不同)
            let setup_hours = if setup_enabled
                && tracker
                    .last_product(&wo.work_center_id)
                    .is_some_and(|p| p != wo.product_code)
            {
                wo.setup_time_hours
            } else {
                0.0
            };
            let duration_hours = wo.estimated_hours + setup_hours;

            // 4c. 产能门控与落位
            let slot = match tracker.try_allocate(&wo.work_center_id, duration_hours, capacity_enabled)? {
                AllocationOutcome::Placed(slot) => slot,
                AllocationOutcome::Refused(signal) => match self.config.overload_policy {
                    // 默认: 超限落位,方案级冲突在步骤5按工作中心聚合上报
                    OverloadPolicy::PlaceAndFlag => {
                        debug!(
                            work_order = %wo.id,
                            work_center = %signal.work_center_id,
                            "产能超限,按配置超限落位"
                        );
                        tracker.force_allocate(&wo.work_center_id, duration_hours)?
                    }
                    OverloadPolicy::Defer => {
                        conflicts.add(Conflict {
                            kind: ConflictKind::CapacityExceeded,
                            subject: signal.work_center_id.clone(),
                            severity: ConflictSeverity::Warning,
                            message: format!(
                                "{}: capacity exceeded, {} deferred ({:.1}h + {:.1}h > {:.1}h)",
                                signal.work_center_id,
                                wo.id,
                                signal.allocated_hours,
                                signal.requested_hours,
                                signal.capacity_hours
                            ),
                        });
                        unscheduled.push(UnscheduledOrder {
                            work_order_id: wo.id.clone(),
                            work_center_id: wo.work_center_id.clone(),
                            reason: format!(
                                "CAPACITY_DEFERRED: {:.1}h + {:.1}h > {:.1}h",
                                signal.allocated_hours, signal.requested_hours, signal.capacity_hours
                            ),
                        });
                        continue;
                    }
                },
            };

            let seq_no = seq_by_center
                .entry(wo.work_center_id.clone())
                .and_modify(|n| *n += 1)
                .or_insert(1);
            entries.push(ScheduleEntry {
                work_order_id: wo.id.clone(),
                work_center_id: wo.work_center_id.clone(),
                start: slot.start,
                end: slot.end,
                duration_hours,
                setup_hours,
                seq_no: *seq_no,
            });
            tracker.record_product(&wo.work_center_id, &wo.product_code)?;

            // 4d. 交期检查 (非阻断)
            if slot.end.date() > wo.due_date {
                conflicts.add(Conflict {
                    kind: ConflictKind::DueDateMiss,
                    subject: wo.id.clone(),
                    severity: if due_dates_enabled {
                        ConflictSeverity::Warning
                    } else {
                        ConflictSeverity::Info
                    },
                    message: format!(
                        "{}: projected finish {} misses due date {}",
                        wo.id,
                        slot.end.format("%Y-%m-%d %H:%M"),
                        wo.due_date
                    ),
                });
            }
        }

        // ==========================================
        // 步骤5: 利用率与方案级产能冲突聚合
        // ==========================================
        let utilization = tracker.utilization();
        for row in &utilization {
            if row.is_over_capacity() {
                conflicts.add(Conflict {
                    kind: ConflictKind::CapacityExceeded,
                    subject: row.work_center_id.clone(),
                    severity: if capacity_enabled {
                        ConflictSeverity::Blocking
                    } else {
                        ConflictSeverity::Info
                    },
                    message: format!(
                        "{}: allocated {:.1}h exceeds capacity {:.1}h ({}%)",
                        row.work_center_id,
                        row.allocated_hours,
                        row.capacity_hours,
                        row.utilization_percent
                    ),
                });
            }
        }
        conflicts.sort();

        let now = Utc::now().naive_utc();
        let schedule = Schedule {
            id: format!("SCH-{}", Uuid::new_v4()),
            period: *period,
            entries,
            status: ScheduleStatus::Draft,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        info!(
            schedule_id = %schedule.id,
            placed = schedule.entries.len(),
            unscheduled = unscheduled.len(),
            conflicts = conflicts.len(),
            "排产求解完成"
        );

        Ok(SolveOutcome::Completed(Box::new(SolveOutput {
            schedule,
            conflicts,
            utilization,
            material_requirements: projection.into_requirements(),
            unscheduled,
        })))
    }

    // 致命校验: 周期 / 候选集 / 工作中心引用
    fn validate(&self, snapshot: &PlanningSnapshot, period: &SchedulePeriod) -> SchedulerResult<()> {
        if !period.is_valid() {
            return Err(SchedulerError::InvalidPeriod {
                start: period.start.to_string(),
                end: period.end.to_string(),
            });
        }
        if snapshot.work_orders.is_empty() {
            return Err(SchedulerError::EmptyCandidateSet);
        }
        let known: std::collections::HashSet<&str> =
            snapshot.work_centers.iter().map(|wc| wc.id.as_str()).collect();
        for wo in &snapshot.work_orders {
            if !known.contains(wo.work_center_id.as_str()) {
                return Err(SchedulerError::UnknownWorkCenter {
                    work_center_id: wo.work_center_id.clone(),
                    work_order_id: wo.id.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
