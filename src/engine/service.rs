// ==========================================
// 生产订单排产系统 - 排产服务编排
// ==========================================
// 职责: 快照捕获 -> 求解 -> 草稿落库 -> 发布 的流程编排
// 红线: 同一方案同一时刻只允许一个求解/发布在途 (SolveInProgress)
// 红线: 被取消的求解不落库,已有草稿保持原样
// ==========================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

use crate::domain::constraint::ConstraintSet;
use crate::domain::schedule::{Schedule, SchedulePeriod};
use crate::engine::conflict::ConflictReport;
use crate::engine::error::{SchedulerError, SchedulerResult};
use crate::engine::policy::SequencingPolicy;
use crate::engine::scheduler::{CancelFlag, Scheduler, SolveOutcome, SolveOutput};
use crate::engine::snapshot::{PlanningSnapshot, SnapshotSources};
use crate::repository::error::RepositoryError;
use crate::repository::ScheduleRepository;

// ==========================================
// SolveGuard - 方案级在途互斥 (RAII)
// ==========================================
struct SolveGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    schedule_id: String,
}

impl SolveGuard {
    fn acquire(
        in_flight: &Arc<Mutex<HashSet<String>>>,
        schedule_id: &str,
    ) -> SchedulerResult<Self> {
        let mut set = in_flight
            .lock()
            .map_err(|e| SchedulerError::Source(anyhow::anyhow!("在途集合锁获取失败: {}", e)))?;
        if !set.insert(schedule_id.to_string()) {
            return Err(SchedulerError::SolveInProgress(schedule_id.to_string()));
        }
        Ok(Self {
            in_flight: in_flight.clone(),
            schedule_id: schedule_id.to_string(),
        })
    }
}

impl Drop for SolveGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.schedule_id);
        }
    }
}

// ==========================================
// SchedulingService - 排产服务
// ==========================================
pub struct SchedulingService {
    scheduler: Scheduler,
    sources: SnapshotSources,
    repository: Arc<ScheduleRepository>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl SchedulingService {
    pub fn new(
        scheduler: Scheduler,
        sources: SnapshotSources,
        repository: Arc<ScheduleRepository>,
    ) -> Self {
        Self {
            scheduler,
            sources,
            repository,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// 生成新方案并保存为草稿
    ///
    /// 流程: 捕获快照 -> 求解 -> save_draft。
    /// 取消发生时不落库,返回 `SolveOutcome::Cancelled`。
    #[instrument(skip_all, fields(candidates = work_order_ids.len(), policy = policy.as_str()))]
    pub async fn generate(
        &self,
        work_order_ids: &[String],
        period: &SchedulePeriod,
        constraints: &ConstraintSet,
        policy: &SequencingPolicy,
        cancel: &CancelFlag,
    ) -> SchedulerResult<SolveOutcome> {
        let snapshot = PlanningSnapshot::capture(&self.sources, work_order_ids).await?;

        match self
            .scheduler
            .generate_cancellable(&snapshot, period, constraints, policy, cancel)?
        {
            SolveOutcome::Cancelled => {
                info!("求解被取消,未落库");
                Ok(SolveOutcome::Cancelled)
            }
            SolveOutcome::Completed(mut output) => {
                output.schedule.version =
                    self.repository.save_draft(&output.schedule, &output.conflicts)?;
                Ok(SolveOutcome::Completed(output))
            }
        }
    }

    /// 重算既有草稿 (完整替换条目与冲突,方案号不变)
    ///
    /// # 错误
    /// - `SolveInProgress`: 该方案已有求解/发布在途
    /// - `Repository(NotFound)`: 方案不存在
    /// - `Repository(InvalidStateTransition)`: 方案已发布,不可重算
    #[instrument(skip_all, fields(schedule_id = %schedule_id, policy = policy.as_str()))]
    pub async fn regenerate(
        &self,
        schedule_id: &str,
        work_order_ids: &[String],
        period: &SchedulePeriod,
        constraints: &ConstraintSet,
        policy: &SequencingPolicy,
        cancel: &CancelFlag,
    ) -> SchedulerResult<SolveOutcome> {
        let _guard = SolveGuard::acquire(&self.in_flight, schedule_id)?;

        let existing = self
            .repository
            .find_by_id(schedule_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            })?;
        if !existing.is_draft() {
            return Err(RepositoryError::InvalidStateTransition {
                schedule_id: schedule_id.to_string(),
                from: existing.status.to_db_str().to_string(),
                to: "DRAFT".to_string(),
            }
            .into());
        }

        let snapshot = PlanningSnapshot::capture(&self.sources, work_order_ids).await?;

        match self
            .scheduler
            .generate_cancellable(&snapshot, period, constraints, policy, cancel)?
        {
            SolveOutcome::Cancelled => {
                info!(schedule_id = %schedule_id, "重算被取消,草稿保持原样");
                Ok(SolveOutcome::Cancelled)
            }
            SolveOutcome::Completed(mut output) => {
                // 方案号与版本沿用既有草稿,落库时走乐观锁
                output.schedule.id = existing.id.clone();
                output.schedule.version = existing.version;
                output.schedule.created_at = existing.created_at;
                output.schedule.version =
                    self.repository.save_draft(&output.schedule, &output.conflicts)?;
                Ok(SolveOutcome::Completed(output))
            }
        }
    }

    /// 发布草稿
    ///
    /// 存在阻断级冲突时拒绝,除非 `override_blocking` 显式放行。
    #[instrument(skip(self), fields(schedule_id = %schedule_id))]
    pub async fn publish(
        &self,
        schedule_id: &str,
        expected_version: i32,
        override_blocking: bool,
    ) -> SchedulerResult<i32> {
        let _guard = SolveGuard::acquire(&self.in_flight, schedule_id)?;

        match self
            .repository
            .publish(schedule_id, expected_version, override_blocking)
        {
            Ok(version) => Ok(version),
            Err(RepositoryError::PublishBlocked {
                schedule_id,
                blocking_count,
            }) => {
                warn!(
                    schedule_id = %schedule_id,
                    blocking_count,
                    "发布被阻断级冲突拒绝"
                );
                Err(RepositoryError::PublishBlocked {
                    schedule_id,
                    blocking_count,
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 保存调用方手工调整后的草稿 (乐观锁覆盖)
    pub fn save_draft(
        &self,
        schedule: &Schedule,
        conflicts: &ConflictReport,
    ) -> SchedulerResult<i32> {
        Ok(self.repository.save_draft(schedule, conflicts)?)
    }

    /// 查询方案 (含条目)
    pub fn find_schedule(&self, schedule_id: &str) -> SchedulerResult<Option<Schedule>> {
        Ok(self.repository.find_by_id(schedule_id)?)
    }

    /// 查询方案的冲突报告
    pub fn find_conflicts(&self, schedule_id: &str) -> SchedulerResult<ConflictReport> {
        Ok(self.repository.find_conflicts(schedule_id)?)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_guard_mutual_exclusion() {
        let in_flight = Arc::new(Mutex::new(HashSet::new()));

        let guard = SolveGuard::acquire(&in_flight, "SCH-1").unwrap();
        // 同一方案第二次获取被拒绝
        assert!(matches!(
            SolveGuard::acquire(&in_flight, "SCH-1"),
            Err(SchedulerError::SolveInProgress(id)) if id == "SCH-1"
        ));
        // 不同方案互不影响
        let other = SolveGuard::acquire(&in_flight, "SCH-2").unwrap();
        drop(other);

        // 释放后可再次获取
        drop(guard);
        assert!(SolveGuard::acquire(&in_flight, "SCH-1").is_ok());
    }
}
