// ==========================================
// 生产订单排产系统 - 演示入口
// ==========================================
// 用途: 用一组演示数据走完 生成草稿 -> 查看冲突 -> 发布 的完整流程
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use production_aps::db;
use production_aps::domain::constraint::ConstraintSet;
use production_aps::domain::material::{BomLine, InventoryLevel};
use production_aps::domain::schedule::SchedulePeriod;
use production_aps::domain::types::WorkOrderStatus;
use production_aps::domain::work_order::{WorkCenter, WorkOrder};
use production_aps::engine::snapshot::InMemoryPlanningData;
use production_aps::engine::{CancelFlag, Scheduler, SchedulingService, SequencingPolicy, SolveOutcome};
use production_aps::logging;
use production_aps::repository::{RepositoryError, ScheduleRepository};
use production_aps::SchedulerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let conn = db::open_in_memory_connection()?;
    db::init_schedule_schema(&conn)?;
    let repository = Arc::new(ScheduleRepository::new(Arc::new(Mutex::new(conn))));

    let data = demo_data();
    let work_order_ids: Vec<String> = data.work_orders.iter().map(|wo| wo.id.clone()).collect();
    let service = SchedulingService::new(
        Scheduler::new(SchedulerConfig::default()),
        data.into_sources(),
        repository.clone(),
    );

    let period = SchedulePeriod::new(
        NaiveDate::from_ymd_opt(2025, 10, 13).ok_or_else(|| anyhow::anyhow!("非法日期"))?,
        NaiveDate::from_ymd_opt(2025, 10, 19).ok_or_else(|| anyhow::anyhow!("非法日期"))?,
    );

    let outcome = service
        .generate(
            &work_order_ids,
            &period,
            &ConstraintSet::all_enabled(),
            &SequencingPolicy::Priority,
            &CancelFlag::new(),
        )
        .await?;

    let output = match outcome {
        SolveOutcome::Completed(output) => output,
        SolveOutcome::Cancelled => {
            println!("求解被取消");
            return Ok(());
        }
    };

    println!("排产方案: {} (版本 {})", output.schedule.id, output.schedule.version);
    println!("排产周期: {} ~ {}", period.start, period.end);

    println!("\n== 落位条目 ({}) ==", output.schedule.entries.len());
    for entry in &output.schedule.entries {
        println!(
            "  {:<14} {:<12} {} ~ {}  {:>5.1}h (换产 {:.1}h)",
            entry.work_order_id,
            entry.work_center_id,
            entry.start.format("%m-%d %H:%M"),
            entry.end.format("%m-%d %H:%M"),
            entry.duration_hours,
            entry.setup_hours,
        );
    }

    println!("\n== 工作中心利用率 ==");
    for row in &output.utilization {
        println!(
            "  {:<12} {:>6.1}h / {:>6.1}h  {:>3}%",
            row.work_center_id, row.allocated_hours, row.capacity_hours, row.utilization_percent
        );
    }

    println!("\n== 物料需求 ==");
    for req in &output.material_requirements {
        println!(
            "  {:<12} 需求 {:>7.0}  可用 {:>7.0}  缺口 {:>6.0}  [{}]",
            req.material_code, req.required, req.available, req.shortfall, req.status
        );
    }

    println!("\n== 冲突报告 ({}) ==", output.conflicts.len());
    for conflict in output.conflicts.iter() {
        println!("  [{:>8}] {}", conflict.severity, conflict.message);
    }

    // 发布闸门演示: 缺料的阻断冲突需要显式放行
    match service.publish(&output.schedule.id, output.schedule.version, false).await {
        Err(e) => println!("\n发布被拒绝: {}", e),
        Ok(version) => println!("\n已发布 (版本 {})", version),
    }
    let version = service
        .publish(&output.schedule.id, output.schedule.version, true)
        .await?;
    println!("显式放行后发布成功 (版本 {})", version);

    // PUBLISHED 为终态: 再次发布必须失败
    if let Err(e) = repository.publish(&output.schedule.id, version, true) {
        if matches!(
            e,
            RepositoryError::InvalidStateTransition { .. }
        ) {
            println!("重复发布被拒绝: {}", e);
        }
    }

    Ok(())
}

// 演示数据: 8 张候选工单 + 4 个工作中心 + 当周库存快照
fn demo_data() -> InMemoryPlanningData {
    let wo = |id: &str,
              product_name: &str,
              product_code: &str,
              quantity: u32,
              due: (i32, u32, u32),
              priority: u8,
              est: f64,
              setup: f64,
              ops: u32,
              material: bool,
              wc: &str| WorkOrder {
        id: id.to_string(),
        product_code: product_code.to_string(),
        product_name: product_name.to_string(),
        quantity,
        due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2).unwrap_or_default(),
        status: WorkOrderStatus::Released,
        priority,
        estimated_hours: est,
        setup_time_hours: setup,
        operation_count: ops,
        material_available: material,
        work_center_id: wc.to_string(),
        created_at: None,
    };

    InMemoryPlanningData {
        work_orders: vec![
            wo("WO-2025-1001", "Ball Bearing 6205", "PRD-BB-6205", 1000, (2025, 10, 20), 1, 8.0, 1.0, 3, true, "CNC-01"),
            wo("WO-2025-1002", "Shaft Assembly SA-450", "PRD-SA-450", 500, (2025, 10, 22), 1, 16.0, 2.0, 5, true, "CNC-01"),
            wo("WO-2025-1003", "Gear Pinion GP-230", "PRD-GP-230", 750, (2025, 10, 18), 2, 12.0, 1.5, 4, true, "CNC-02"),
            wo("WO-2025-1004", "Housing Unit HU-890", "PRD-HU-890", 300, (2025, 10, 25), 1, 12.0, 2.0, 6, false, "CNC-03"),
            wo("WO-2025-1005", "Flange FL-550", "PRD-FL-550", 600, (2025, 10, 19), 3, 8.0, 1.0, 3, true, "CNC-02"),
            wo("WO-2025-1006", "Coupling CG-770", "PRD-CG-770", 400, (2025, 10, 21), 2, 10.0, 1.5, 4, true, "CNC-01"),
            wo("WO-2025-1007", "Bushing BS-220", "PRD-BS-220", 800, (2025, 10, 23), 3, 6.0, 0.5, 2, true, "CNC-03"),
            wo("WO-2025-1008", "Valve Body VB-340", "PRD-VB-340", 200, (2025, 10, 24), 2, 14.0, 2.0, 7, false, "CNC-02"),
        ],
        work_centers: vec![
            WorkCenter { id: "CNC-01".to_string(), capacity_hours_per_period: 168.0 },
            WorkCenter { id: "CNC-02".to_string(), capacity_hours_per_period: 168.0 },
            WorkCenter { id: "CNC-03".to_string(), capacity_hours_per_period: 168.0 },
            WorkCenter { id: "Assembly-01".to_string(), capacity_hours_per_period: 120.0 },
        ],
        bom_lines: vec![
            BomLine {
                product_code: "PRD-SA-450".to_string(),
                material_code: "RM-ST-304".to_string(),
                material_name: "Stainless Steel 304".to_string(),
                quantity_per_unit: 5.0,
            },
            BomLine {
                product_code: "PRD-HU-890".to_string(),
                material_code: "RM-AL-6061".to_string(),
                material_name: "Aluminum 6061".to_string(),
                quantity_per_unit: 6.0,
            },
            BomLine {
                product_code: "PRD-BS-220".to_string(),
                material_code: "RM-BR-C360".to_string(),
                material_name: "Brass C360".to_string(),
                quantity_per_unit: 1.0,
            },
            BomLine {
                product_code: "PRD-VB-340".to_string(),
                material_code: "RM-CI-GG25".to_string(),
                material_name: "Cast Iron GG25".to_string(),
                quantity_per_unit: 6.0,
            },
        ],
        inventory: vec![
            InventoryLevel {
                material_code: "RM-ST-304".to_string(),
                material_name: "Stainless Steel 304".to_string(),
                available_quantity: 2500.0,
            },
            InventoryLevel {
                material_code: "RM-AL-6061".to_string(),
                material_name: "Aluminum 6061".to_string(),
                available_quantity: 1200.0,
            },
            InventoryLevel {
                material_code: "RM-BR-C360".to_string(),
                material_name: "Brass C360".to_string(),
                available_quantity: 800.0,
            },
            InventoryLevel {
                material_code: "RM-CI-GG25".to_string(),
                material_name: "Cast Iron GG25".to_string(),
                available_quantity: 1000.0,
            },
        ],
    }
}
