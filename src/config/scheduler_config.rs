// ==========================================
// 生产订单排产系统 - 求解器配置
// ==========================================
// 约束开关属于单次求解入参 (ConstraintSet);
// 这里只放跨求解复用的处置策略与阈值,保证结果可复现
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::types::{OverloadPolicy, ShortagePolicy};

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 产能超限处置 (默认: 落位并标记)
    #[serde(default)]
    pub overload_policy: OverloadPolicy,

    /// 物料缺口处置 (默认: 照常落位,带阻断冲突)
    #[serde(default)]
    pub shortage_policy: ShortagePolicy,

    /// 严重缺料阈值比例: available < ratio * required 判为 shortage
    #[serde(default = "default_shortage_threshold_ratio")]
    pub shortage_threshold_ratio: f64,

    /// 工作日起始整点 (排产游标从 period.start 当日该时刻开始推进)
    #[serde(default = "default_work_day_start_hour")]
    pub work_day_start_hour: u32,
}

fn default_shortage_threshold_ratio() -> f64 {
    0.75
}

fn default_work_day_start_hour() -> u32 {
    8
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            overload_policy: OverloadPolicy::default(),
            shortage_policy: ShortagePolicy::default(),
            shortage_threshold_ratio: default_shortage_threshold_ratio(),
            work_day_start_hour: default_work_day_start_hour(),
        }
    }
}

impl SchedulerConfig {
    /// 从 JSON 文件加载 (缺失字段落默认值)
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SchedulerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// 配置有效性检查
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.shortage_threshold_ratio) {
            anyhow::bail!(
                "shortage_threshold_ratio 必须在 [0,1] 区间: {}",
                self.shortage_threshold_ratio
            );
        }
        if self.work_day_start_hour >= 24 {
            anyhow::bail!("work_day_start_hour 必须小于 24: {}", self.work_day_start_hour);
        }
        Ok(())
    }
}
