// ==========================================
// 生产订单排产系统 - 物料领域模型
// ==========================================
// BOM 与库存由外部模块维护,求解开始时一次性快照读取
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::MaterialStatus;

// ==========================================
// BomLine - BOM 行 (产品 -> 物料消耗)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    pub product_code: String,   // 产品编码
    pub material_code: String,  // 物料编码
    pub material_name: String,  // 物料名称
    pub quantity_per_unit: f64, // 单件消耗量
}

// ==========================================
// InventoryLevel - 库存水平
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub material_code: String,   // 物料编码
    pub material_name: String,   // 物料名称
    pub available_quantity: f64, // 可用库存
}

// ==========================================
// MaterialRequirement - 物料需求投影
// ==========================================
// 需求量为候选集内所有工单 BOM 需求按物料聚合之和
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material_code: String,  // 物料编码
    pub material_name: String,  // 物料名称
    pub required: f64,          // 需求量
    pub available: f64,         // 可用量
    pub status: MaterialStatus, // available / partial / shortage
    pub shortfall: f64,         // 缺口 = max(required - available, 0)
}

impl MaterialRequirement {
    /// 分级规则:
    /// - required <= available            => AVAILABLE
    /// - available = 0 或低于阈值比例     => SHORTAGE
    /// - 其余                             => PARTIAL
    ///
    /// `shortage_threshold_ratio`: available < ratio * required 视为严重缺料
    pub fn classify(
        material_code: &str,
        material_name: &str,
        required: f64,
        available: f64,
        shortage_threshold_ratio: f64,
    ) -> Self {
        let status = if required <= available {
            MaterialStatus::Available
        } else if available <= 0.0 || available < shortage_threshold_ratio * required {
            MaterialStatus::Shortage
        } else {
            MaterialStatus::Partial
        };
        Self {
            material_code: material_code.to_string(),
            material_name: material_name.to_string(),
            required,
            available,
            status,
            shortfall: (required - available).max(0.0),
        }
    }
}
