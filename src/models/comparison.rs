use crate::models::Approval;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 对比表行 (t_comparison_slot) — 每 (发票, 字段, 槽位) 一行
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ComparisonSlot {
    pub supplier_id: String,
    pub invoice_number: String,
    pub field_name: String,
    pub slot_index: i32, // 1 起始, 连续无洞
    pub xml_value: Option<String>,
    pub po_value: Option<String>,
    pub approval: Option<String>,
    pub disposition: Option<String>,
}

/// 一个字段的全部槽位值 — 阶段输出, 镜像层展开为行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field: String,
    pub xml_values: Vec<String>,
    pub po_values: Vec<String>,
    pub approvals: Vec<Approval>,
}

impl FieldComparison {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            xml_values: Vec::new(),
            po_values: Vec::new(),
            approvals: Vec::new(),
        }
    }

    /// 槽位数 = 三个向量的最长者
    pub fn slot_count(&self) -> usize {
        self.xml_values
            .len()
            .max(self.po_values.len())
            .max(self.approvals.len())
    }

    /// 该字段是否整体通过
    pub fn all_approved(&self) -> bool {
        self.approvals.iter().all(|a| a.is_ok())
    }
}
