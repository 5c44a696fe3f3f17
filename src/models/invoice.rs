use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 发票主表 (t_invoice_doc) — 每张待处置的电子单据一行
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceDoc {
    pub supplier_id: String,
    pub invoice_number: String,
    pub doc_type: String, // FV / NC / ND
    pub order_number: Option<String>,
    pub issuer_name: Option<String>,
    pub currency: Option<String>,
    pub payment_term: Option<String>,
    pub to_pay: Option<BigDecimal>,
    pub to_pay_cop: Option<BigDecimal>,
    pub calc_rate: Option<BigDecimal>,
    pub issue_date: Option<NaiveDate>,
    pub disposition: Option<String>,
    pub observation: Option<String>,
}

/// 发票明细表 (t_invoice_line) — 核心只读
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub supplier_id: String,
    pub invoice_number: String,
    pub line_seq: i32,
    pub description: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub unit_price: Option<BigDecimal>,
    pub lea_value: Option<BigDecimal>,
}
