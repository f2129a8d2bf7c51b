// ==========================================
// 求解器集成测试
// ==========================================
// 测试目标: 验证 快照 -> 求解 -> 冲突报告 的端到端行为
// ==========================================

mod test_helpers;

use chrono::{NaiveDate, Utc};
use production_aps::domain::constraint::{ConstraintId, ConstraintSet};
use production_aps::domain::types::{ConflictKind, ConflictSeverity, MaterialStatus};
use production_aps::engine::snapshot::PlanningSnapshot;
use production_aps::engine::{Scheduler, SequencingPolicy};
use production_aps::logging;
use test_helpers::{test_bom, test_inventory, test_period, test_work_center, test_work_order};

fn snapshot_three_orders_one_center() -> PlanningSnapshot {
    // CNC-01 周产能 24h; 三张工单合计 26h
    let mut wo1 = test_work_order("WO-1", 8.0);
    wo1.priority = 1;
    let mut wo2 = test_work_order("WO-2", 12.0);
    wo2.priority = 2;
    let mut wo3 = test_work_order("WO-3", 6.0);
    wo3.priority = 3;

    PlanningSnapshot {
        work_orders: vec![wo3.clone(), wo1.clone(), wo2.clone()],
        work_centers: vec![test_work_center("CNC-01", 24.0)],
        bom_lines: vec![],
        inventory: vec![],
        taken_at: Utc::now().naive_utc(),
    }
}

#[test]
fn test_overload_places_all_and_flags_center() {
    logging::init_test();

    let snapshot = snapshot_three_orders_one_center();
    let output = Scheduler::default()
        .generate(
            &snapshot,
            &test_period(),
            &ConstraintSet::all_enabled(),
            &SequencingPolicy::Priority,
        )
        .unwrap();

    // 默认策略: 每张选中的工单都要落位
    assert_eq!(output.schedule.entries.len(), 3);
    let ids: Vec<&str> = output
        .schedule
        .entries
        .iter()
        .map(|e| e.work_order_id.as_str())
        .collect();
    assert_eq!(ids, vec!["WO-1", "WO-2", "WO-3"]);

    // 时间槽首尾相接,从工作日 08:00 开始
    let first = &output.schedule.entries[0];
    assert_eq!(
        first.start,
        NaiveDate::from_ymd_opt(2025, 10, 13).unwrap().and_hms_opt(8, 0, 0).unwrap()
    );
    for pair in output.schedule.entries.windows(2) {
        assert_eq!(pair[1].start, pair[0].end);
    }

    // 26h > 24h: 工作中心级阻断冲突,利用率 108%
    assert_eq!(output.utilization.len(), 1);
    assert_eq!(output.utilization[0].allocated_hours, 26.0);
    assert_eq!(output.utilization[0].utilization_percent, 108);

    let capacity: Vec<_> = output
        .conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::CapacityExceeded)
        .collect();
    assert_eq!(capacity.len(), 1);
    assert_eq!(capacity[0].subject, "CNC-01");
    assert_eq!(capacity[0].severity, ConflictSeverity::Blocking);
    assert!(output.unscheduled.is_empty());
}

#[test]
fn test_same_input_same_output() {
    let snapshot = snapshot_three_orders_one_center();
    let scheduler = Scheduler::default();
    let constraints = ConstraintSet::all_enabled();

    let a = scheduler
        .generate(&snapshot, &test_period(), &constraints, &SequencingPolicy::Priority)
        .unwrap();
    let b = scheduler
        .generate(&snapshot, &test_period(), &constraints, &SequencingPolicy::Priority)
        .unwrap();

    // 方案号随机,其余全部确定
    assert_eq!(a.schedule.entries, b.schedule.entries);
    assert_eq!(a.conflicts.messages(), b.conflicts.messages());
    assert_eq!(a.utilization, b.utilization);
    assert_eq!(a.unscheduled, b.unscheduled);
}

#[test]
fn test_edd_policy_orders_by_due_date() {
    let mut late = test_work_order("WO-LATE", 4.0);
    late.priority = 1;
    late.due_date = NaiveDate::from_ymd_opt(2025, 10, 30).unwrap();
    let mut early = test_work_order("WO-EARLY", 4.0);
    early.priority = 9;
    early.due_date = NaiveDate::from_ymd_opt(2025, 10, 14).unwrap();

    let snapshot = PlanningSnapshot {
        work_orders: vec![late, early],
        work_centers: vec![test_work_center("CNC-01", 168.0)],
        bom_lines: vec![],
        inventory: vec![],
        taken_at: Utc::now().naive_utc(),
    };

    let output = Scheduler::default()
        .generate(
            &snapshot,
            &test_period(),
            &ConstraintSet::all_enabled(),
            &SequencingPolicy::Edd,
        )
        .unwrap();

    // EDD: 交期早的先落位,即使优先级低
    assert_eq!(output.schedule.entries[0].work_order_id, "WO-EARLY");
    assert_eq!(output.schedule.entries[1].work_order_id, "WO-LATE");
}

#[test]
fn test_material_projection_feeds_conflicts() {
    // PRD-HU 需要 6061 铝材 300*6=1800, 库存仅 1200 => 缺口 600
    let mut shortage_order = test_work_order("WO-2025-1004", 12.0);
    shortage_order.product_code = "PRD-HU-890".to_string();
    shortage_order.quantity = 300;

    let snapshot = PlanningSnapshot {
        work_orders: vec![shortage_order, test_work_order("WO-OK", 8.0)],
        work_centers: vec![test_work_center("CNC-01", 168.0)],
        bom_lines: vec![test_bom("PRD-HU-890", "RM-AL-6061", 6.0)],
        inventory: vec![test_inventory("RM-AL-6061", 1200.0)],
        taken_at: Utc::now().naive_utc(),
    };

    let output = Scheduler::default()
        .generate(
            &snapshot,
            &test_period(),
            &ConstraintSet::all_enabled(),
            &SequencingPolicy::Priority,
        )
        .unwrap();

    let row = output
        .material_requirements
        .iter()
        .find(|r| r.material_code == "RM-AL-6061")
        .unwrap();
    assert_eq!(row.required, 1800.0);
    assert_eq!(row.available, 1200.0);
    assert_eq!(row.shortfall, 600.0);
    assert_eq!(row.status, MaterialStatus::Shortage);

    // 默认 PlanAnyway: 缺料工单照常落位,带阻断冲突
    assert_eq!(output.schedule.entries.len(), 2);
    let shortage: Vec<_> = output
        .conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::MaterialShortage)
        .collect();
    assert_eq!(shortage.len(), 1);
    assert_eq!(shortage[0].subject, "WO-2025-1004");
    assert_eq!(shortage[0].severity, ConflictSeverity::Blocking);
}

#[test]
fn test_disabled_constraints_keep_informational_reporting() {
    let mut shortage_order = test_work_order("WO-SHORT", 30.0);
    shortage_order.material_available = false;
    shortage_order.due_date = NaiveDate::from_ymd_opt(2025, 10, 13).unwrap();

    let snapshot = PlanningSnapshot {
        work_orders: vec![shortage_order],
        work_centers: vec![test_work_center("CNC-01", 24.0)],
        bom_lines: vec![],
        inventory: vec![],
        taken_at: Utc::now().naive_utc(),
    };

    let constraints = ConstraintSet::all_enabled()
        .with_disabled(ConstraintId::WorkCenterCapacity)
        .with_disabled(ConstraintId::MaterialAvailability)
        .with_disabled(ConstraintId::DueDates);

    let output = Scheduler::default()
        .generate(&snapshot, &test_period(), &constraints, &SequencingPolicy::Priority)
        .unwrap();

    // 禁用不等于沉默: 三类冲突都以 INFO 级上报,且无阻断
    assert_eq!(output.schedule.entries.len(), 1);
    assert!(!output.conflicts.has_blocking());
    for kind in [
        ConflictKind::CapacityExceeded,
        ConflictKind::MaterialShortage,
        ConflictKind::DueDateMiss,
    ] {
        let found = output.conflicts.iter().find(|c| c.kind == kind).unwrap();
        assert_eq!(found.severity, ConflictSeverity::Info, "{:?}", kind);
    }
}

#[test]
fn test_conflict_report_sorted_by_severity() {
    let mut shortage_order = test_work_order("WO-A", 30.0);
    shortage_order.material_available = false;
    shortage_order.due_date = NaiveDate::from_ymd_opt(2025, 10, 13).unwrap();

    let snapshot = PlanningSnapshot {
        work_orders: vec![shortage_order],
        work_centers: vec![test_work_center("CNC-01", 24.0)],
        bom_lines: vec![],
        inventory: vec![],
        taken_at: Utc::now().naive_utc(),
    };

    let output = Scheduler::default()
        .generate(
            &snapshot,
            &test_period(),
            &ConstraintSet::all_enabled(),
            &SequencingPolicy::Priority,
        )
        .unwrap();

    let severities: Vec<ConflictSeverity> = output.conflicts.iter().map(|c| c.severity).collect();
    let mut sorted = severities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(severities, sorted);
}
