// ==========================================
// 生产订单排产系统 - 冲突报告
// ==========================================
// 红线: 冲突是数据,由人工在发布前裁决,引擎绝不替用户决定
// 排序: 严重度降序 -> 主体 -> 类型,保证同输入同输出
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::{ConflictKind, ConflictSeverity};

// ==========================================
// Conflict - 单条冲突
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,         // 冲突类型
    pub subject: String,            // 主体 (工作中心代码 / 工单号)
    pub severity: ConflictSeverity, // 严重度
    pub message: String,            // 人类可读描述
}

// ==========================================
// ConflictReport - 冲突报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    /// 确定性排序: 严重度降序,主体升序,类型升序
    pub fn sort(&mut self) {
        self.conflicts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.subject.cmp(&b.subject))
                .then_with(|| a.kind.cmp(&b.kind))
        });
    }

    /// 是否存在阻断级冲突 (发布闸门)
    pub fn has_blocking(&self) -> bool {
        self.conflicts
            .iter()
            .any(|c| c.severity == ConflictSeverity::Blocking)
    }

    pub fn blocking_count(&self) -> usize {
        self.conflicts
            .iter()
            .filter(|c| c.severity == ConflictSeverity::Blocking)
            .count()
    }

    /// 人类可读的冲突文本列表 (保持报告顺序)
    pub fn messages(&self) -> Vec<String> {
        self.conflicts.iter().map(|c| c.message.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

impl From<Vec<Conflict>> for ConflictReport {
    fn from(conflicts: Vec<Conflict>) -> Self {
        Self { conflicts }
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(kind: ConflictKind, subject: &str, severity: ConflictSeverity) -> Conflict {
        Conflict {
            kind,
            subject: subject.to_string(),
            severity,
            message: format!("{}: {}", subject, kind),
        }
    }

    #[test]
    fn test_sort_severity_then_subject_then_kind() {
        let mut report = ConflictReport::new();
        report.add(conflict(ConflictKind::DueDateMiss, "WO-9", ConflictSeverity::Warning));
        report.add(conflict(ConflictKind::CapacityExceeded, "CNC-02", ConflictSeverity::Blocking));
        report.add(conflict(ConflictKind::MaterialShortage, "WO-1", ConflictSeverity::Info));
        report.add(conflict(ConflictKind::CapacityExceeded, "CNC-01", ConflictSeverity::Blocking));
        report.sort();

        let order: Vec<(&str, ConflictSeverity)> = report
            .iter()
            .map(|c| (c.subject.as_str(), c.severity))
            .collect();
        assert_eq!(
            order,
            vec![
                ("CNC-01", ConflictSeverity::Blocking),
                ("CNC-02", ConflictSeverity::Blocking),
                ("WO-9", ConflictSeverity::Warning),
                ("WO-1", ConflictSeverity::Info),
            ]
        );
    }

    #[test]
    fn test_blocking_gate() {
        let mut report = ConflictReport::new();
        assert!(!report.has_blocking());
        report.add(conflict(ConflictKind::DueDateMiss, "WO-1", ConflictSeverity::Warning));
        assert!(!report.has_blocking());
        report.add(conflict(ConflictKind::CapacityExceeded, "CNC-01", ConflictSeverity::Blocking));
        assert!(report.has_blocking());
        assert_eq!(report.blocking_count(), 1);
    }
}
