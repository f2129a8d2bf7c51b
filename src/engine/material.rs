// ==========================================
// 生产订单排产系统 - 物料可用性检查器
// ==========================================
// 职责: 将候选集的 BOM 需求按物料聚合,对照库存快照投影分级
// 红线: 库存只在求解开始时读一次,单次求解内不观察外部变化
// ==========================================

use std::collections::{BTreeMap, HashMap};

use crate::domain::material::{BomLine, InventoryLevel, MaterialRequirement};
use crate::domain::types::MaterialStatus;
use crate::domain::work_order::WorkOrder;

// ==========================================
// MaterialProjection - 一次投影的结果
// ==========================================
// 分级依赖整个候选集的聚合需求,因此按次投影、整体消费
#[derive(Debug, Clone)]
pub struct MaterialProjection {
    requirements: Vec<MaterialRequirement>,
    status_by_code: HashMap<String, MaterialStatus>,
}

impl MaterialProjection {
    /// 物料需求行 (按物料编码升序)
    pub fn requirements(&self) -> &[MaterialRequirement] {
        &self.requirements
    }

    pub fn into_requirements(self) -> Vec<MaterialRequirement> {
        self.requirements
    }

    /// 单一物料的分级 (未出现在候选集需求中的物料视为充足)
    pub fn status_of(&self, material_code: &str) -> MaterialStatus {
        self.status_by_code
            .get(material_code)
            .copied()
            .unwrap_or(MaterialStatus::Available)
    }
}

// ==========================================
// MaterialAvailabilityChecker - 物料可用性检查器
// ==========================================
pub struct MaterialAvailabilityChecker {
    bom_by_product: HashMap<String, Vec<BomLine>>,
    inventory_by_code: HashMap<String, InventoryLevel>,
    shortage_threshold_ratio: f64,
}

impl MaterialAvailabilityChecker {
    /// 基于 BOM 与库存快照构建
    pub fn new(
        bom_lines: &[BomLine],
        inventory: &[InventoryLevel],
        shortage_threshold_ratio: f64,
    ) -> Self {
        let mut bom_by_product: HashMap<String, Vec<BomLine>> = HashMap::new();
        for line in bom_lines {
            bom_by_product
                .entry(line.product_code.clone())
                .or_default()
                .push(line.clone());
        }
        let inventory_by_code = inventory
            .iter()
            .map(|l| (l.material_code.clone(), l.clone()))
            .collect();
        Self {
            bom_by_product,
            inventory_by_code,
            shortage_threshold_ratio,
        }
    }

    /// 对候选集做物料需求投影
    ///
    /// 每个工单按产品 BOM 展开并乘以数量,跨整个候选集按物料编码累加,
    /// 再与库存快照比较分级。输出按物料编码升序,保证确定性。
    pub fn project(&self, work_orders: &[WorkOrder]) -> MaterialProjection {
        // BTreeMap: 物料编码升序
        let mut required: BTreeMap<String, (String, f64)> = BTreeMap::new();
        for wo in work_orders {
            let Some(lines) = self.bom_by_product.get(&wo.product_code) else {
                continue;
            };
            for line in lines {
                let entry = required
                    .entry(line.material_code.clone())
                    .or_insert_with(|| (line.material_name.clone(), 0.0));
                entry.1 += line.quantity_per_unit * wo.quantity as f64;
            }
        }

        let mut requirements = Vec::with_capacity(required.len());
        let mut status_by_code = HashMap::with_capacity(required.len());
        for (code, (name, qty)) in required {
            let available = self
                .inventory_by_code
                .get(&code)
                .map(|l| l.available_quantity)
                .unwrap_or(0.0);
            let req = MaterialRequirement::classify(
                &code,
                &name,
                qty,
                available,
                self.shortage_threshold_ratio,
            );
            status_by_code.insert(code, req.status);
            requirements.push(req);
        }

        MaterialProjection {
            requirements,
            status_by_code,
        }
    }

    /// 单个工单的物料状态 (取其产品各 BOM 物料的最差分级)
    ///
    /// 产品没有 BOM 数据时退化为工单自带的 material_available 标志
    /// (库存模块预判的布尔位)。
    pub fn status_for(&self, projection: &MaterialProjection, wo: &WorkOrder) -> MaterialStatus {
        match self.bom_by_product.get(&wo.product_code) {
            Some(lines) if !lines.is_empty() => lines
                .iter()
                .map(|l| projection.status_of(&l.material_code))
                .max_by_key(|s| match s {
                    MaterialStatus::Available => 0,
                    MaterialStatus::Partial => 1,
                    MaterialStatus::Shortage => 2,
                })
                .unwrap_or(MaterialStatus::Available),
            _ => {
                if wo.material_available {
                    MaterialStatus::Available
                } else {
                    MaterialStatus::Shortage
                }
            }
        }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::WorkOrderStatus;
    use chrono::NaiveDate;

    fn wo(id: &str, product: &str, quantity: u32, material_available: bool) -> WorkOrder {
        WorkOrder {
            id: id.to_string(),
            product_code: product.to_string(),
            product_name: product.to_string(),
            quantity,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            status: WorkOrderStatus::Released,
            priority: 1,
            estimated_hours: 8.0,
            setup_time_hours: 0.0,
            operation_count: 1,
            material_available,
            work_center_id: "CNC-01".to_string(),
            created_at: None,
        }
    }

    fn bom(product: &str, material: &str, per_unit: f64) -> BomLine {
        BomLine {
            product_code: product.to_string(),
            material_code: material.to_string(),
            material_name: material.to_string(),
            quantity_per_unit: per_unit,
        }
    }

    fn stock(material: &str, qty: f64) -> InventoryLevel {
        InventoryLevel {
            material_code: material.to_string(),
            material_name: material.to_string(),
            available_quantity: qty,
        }
    }

    #[test]
    fn test_requirements_aggregate_across_candidate_set() {
        let checker = MaterialAvailabilityChecker::new(
            &[bom("PRD-A", "RM-AL-6061", 2.0), bom("PRD-B", "RM-AL-6061", 1.0)],
            &[stock("RM-AL-6061", 1200.0)],
            0.75,
        );
        // 需求 = 500*2 + 800*1 = 1800
        let projection = checker.project(&[wo("WO-1", "PRD-A", 500, true), wo("WO-2", "PRD-B", 800, true)]);
        let rows = projection.requirements();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].required, 1800.0);
        assert_eq!(rows[0].available, 1200.0);
        assert_eq!(rows[0].shortfall, 600.0);
        assert_eq!(rows[0].status, MaterialStatus::Shortage);
    }

    #[test]
    fn test_missing_inventory_counts_as_zero() {
        let checker = MaterialAvailabilityChecker::new(
            &[bom("PRD-A", "RM-NEW", 1.0)],
            &[],
            0.75,
        );
        let projection = checker.project(&[wo("WO-1", "PRD-A", 10, true)]);
        assert_eq!(projection.requirements()[0].status, MaterialStatus::Shortage);
        assert_eq!(projection.requirements()[0].shortfall, 10.0);
    }

    #[test]
    fn test_status_for_takes_worst_material() {
        let checker = MaterialAvailabilityChecker::new(
            &[bom("PRD-A", "RM-OK", 1.0), bom("PRD-A", "RM-SHORT", 1.0)],
            &[stock("RM-OK", 1000.0), stock("RM-SHORT", 0.0)],
            0.75,
        );
        let orders = vec![wo("WO-1", "PRD-A", 100, true)];
        let projection = checker.project(&orders);
        assert_eq!(checker.status_for(&projection, &orders[0]), MaterialStatus::Shortage);
    }

    #[test]
    fn test_status_for_falls_back_to_flag_without_bom() {
        let checker = MaterialAvailabilityChecker::new(&[], &[], 0.75);
        let orders = vec![wo("WO-1", "PRD-A", 100, false), wo("WO-2", "PRD-B", 10, true)];
        let projection = checker.project(&orders);
        assert_eq!(checker.status_for(&projection, &orders[0]), MaterialStatus::Shortage);
        assert_eq!(checker.status_for(&projection, &orders[1]), MaterialStatus::Available);
    }

    #[test]
    fn test_requirements_sorted_by_material_code() {
        let checker = MaterialAvailabilityChecker::new(
            &[
                bom("PRD-A", "RM-ZZ", 1.0),
                bom("PRD-A", "RM-AA", 1.0),
                bom("PRD-A", "RM-MM", 1.0),
            ],
            &[stock("RM-ZZ", 100.0), stock("RM-AA", 100.0), stock("RM-MM", 100.0)],
            0.75,
        );
        let projection = checker.project(&[wo("WO-1", "PRD-A", 1, true)]);
        let codes: Vec<&str> = projection
            .requirements()
            .iter()
            .map(|r| r.material_code.as_str())
            .collect();
        assert_eq!(codes, vec!["RM-AA", "RM-MM", "RM-ZZ"]);
    }
}
