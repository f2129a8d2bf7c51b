// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use production_aps::db;
use production_aps::domain::material::{BomLine, InventoryLevel};
use production_aps::domain::schedule::SchedulePeriod;
use production_aps::domain::types::WorkOrderStatus;
use production_aps::domain::work_order::{WorkCenter, WorkOrder};
use production_aps::repository::ScheduleRepository;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - ScheduleRepository: 指向该库的仓储
pub fn create_test_repo() -> Result<(NamedTempFile, Arc<ScheduleRepository>), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径非 UTF-8")?
        .to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schedule_schema(&conn)?;

    let repo = Arc::new(ScheduleRepository::new(Arc::new(Mutex::new(conn))));
    Ok((temp_file, repo))
}

/// 测试用工单 (默认: 优先级1, 物料齐套, CNC-01)
pub fn test_work_order(id: &str, estimated_hours: f64) -> WorkOrder {
    WorkOrder {
        id: id.to_string(),
        product_code: format!("PRD-{}", id),
        product_name: format!("Product {}", id),
        quantity: 100,
        due_date: NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
        status: WorkOrderStatus::Released,
        priority: 1,
        estimated_hours,
        setup_time_hours: 0.0,
        operation_count: 3,
        material_available: true,
        work_center_id: "CNC-01".to_string(),
        created_at: None,
    }
}

/// 测试用工作中心
pub fn test_work_center(id: &str, capacity: f64) -> WorkCenter {
    WorkCenter {
        id: id.to_string(),
        capacity_hours_per_period: capacity,
    }
}

/// 测试用排产周期 (2025-10-13 ~ 2025-10-19)
pub fn test_period() -> SchedulePeriod {
    SchedulePeriod::new(
        NaiveDate::from_ymd_opt(2025, 10, 13).unwrap(),
        NaiveDate::from_ymd_opt(2025, 10, 19).unwrap(),
    )
}

/// 测试用 BOM 行
pub fn test_bom(product: &str, material: &str, per_unit: f64) -> BomLine {
    BomLine {
        product_code: product.to_string(),
        material_code: material.to_string(),
        material_name: material.to_string(),
        quantity_per_unit: per_unit,
    }
}

/// 测试用库存水平
pub fn test_inventory(material: &str, quantity: f64) -> InventoryLevel {
    InventoryLevel {
        material_code: material.to_string(),
        material_name: material.to_string(),
        available_quantity: quantity,
    }
}
