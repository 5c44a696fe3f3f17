use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 已消费行的标记值
pub const PROCESSED: &str = "PROCESSED";

/// 历史采购订单行 (t_po_ledger)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct POLine {
    pub supplier_id: String,
    pub order_number: String,
    pub position: String,
    pub supplier_name: Option<String>,
    pub order_class: Option<String>, // ZPRE / ZPPA / ZPCN / ZPSA / ZPSS / 42 / 43 / 45
    pub currency: Option<String>,
    pub to_settle: Option<BigDecimal>, // PorCalcular
    pub trm: Option<BigDecimal>,
    pub unit_price: Option<BigDecimal>,
    pub quantity: Option<BigDecimal>,
    pub account: Option<String>,
    pub tax_indicator: Option<String>,
    pub cost_center: Option<String>,
    pub internal_order: Option<String>,
    pub pep_element: Option<String>,
    pub fixed_asset: Option<String>,
    pub account_class: Option<String>, // ZINV / ZADM
    pub tax_class: Option<String>,
    pub short_text: Option<String>,
    pub doc_date: Option<NaiveDate>,
    pub processed: Option<String>,
}

impl POLine {
    pub fn is_processed(&self) -> bool {
        self.processed.as_deref() == Some(PROCESSED)
    }
}
