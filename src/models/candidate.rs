use crate::models::{InvoiceDoc, InvoiceLine, POLine};
use crate::normalize::{
    is_vacant, join_pipe, normalize_decimal, safe_date_str, safe_decimal_str, safe_str,
    split_pipe,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 候选记录 — 一张发票 + 明细聚合 + 选中的 OC 行子集的扁平拼接
///
/// 遗留契约: 暂存表所有列均为无界文本; 多值列用管道分隔,
/// 阶段引擎内部才展开为数组, 持久化时再拼回。
/// 后缀约定: `_dp` 发票主表, `_ddp` 发票明细聚合, `_hoc` OC 行聚合。
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct CandidateRecord {
    // 发票主表 (_dp)
    pub supplier_id_dp: String,
    pub invoice_number_dp: String,
    pub doc_type_dp: String,
    pub order_number_dp: String,
    pub issuer_name_dp: String,
    pub currency_dp: String,
    pub payment_term_dp: String,
    pub to_pay_dp: String,
    pub to_pay_cop_dp: String,
    pub calc_rate_dp: String,
    pub issue_date_dp: String,

    // 发票明细聚合 (_ddp)
    pub line_seq_ddp: String,
    pub description_ddp: String,
    pub quantity_ddp: String,
    pub unit_price_ddp: String,
    pub lea_value_ddp: String,

    // 选中 OC 行聚合 (_hoc)
    pub position_hoc: String,
    pub to_settle_hoc: String,
    pub order_class_hoc: String,
    pub currency_hoc: String,
    pub trm_hoc: String,
    pub unit_price_hoc: String,
    pub quantity_hoc: String,
    pub account_hoc: String,
    pub tax_indicator_hoc: String,
    pub cost_center_hoc: String,
    pub internal_order_hoc: String,
    pub pep_element_hoc: String,
    pub fixed_asset_hoc: String,
    pub account_class_hoc: String,
    pub supplier_name_hoc: String,
    pub tax_class_hoc: String,
    pub short_text_hoc: String,
    pub doc_date_hoc: String,

    // 原始行号 (明细序与选中 OC 序)
    pub detail_indices: String,
    pub po_indices: String,
}

impl CandidateRecord {
    /// 由匹配结果装配候选记录
    pub fn from_parts(
        inv: &InvoiceDoc,
        details: &[InvoiceLine],
        po_rows: &[POLine],
        chosen: &[usize],
    ) -> Self {
        let po: Vec<&POLine> = chosen.iter().filter_map(|&i| po_rows.get(i)).collect();

        let detail_col = |f: &dyn Fn(&InvoiceLine) -> String| -> String {
            join_pipe(&details.iter().map(|d| f(d)).collect::<Vec<_>>())
        };
        let po_col = |f: &dyn Fn(&POLine) -> String| -> String {
            join_pipe(&po.iter().map(|p| f(p)).collect::<Vec<_>>())
        };

        Self {
            supplier_id_dp: inv.supplier_id.clone(),
            invoice_number_dp: inv.invoice_number.clone(),
            doc_type_dp: inv.doc_type.clone(),
            order_number_dp: safe_str(inv.order_number.as_deref()),
            issuer_name_dp: safe_str(inv.issuer_name.as_deref()),
            currency_dp: safe_str(inv.currency.as_deref()),
            payment_term_dp: safe_str(inv.payment_term.as_deref()),
            to_pay_dp: safe_decimal_str(&inv.to_pay),
            to_pay_cop_dp: safe_decimal_str(&inv.to_pay_cop),
            calc_rate_dp: safe_decimal_str(&inv.calc_rate),
            issue_date_dp: safe_date_str(&inv.issue_date),

            line_seq_ddp: detail_col(&|d| d.line_seq.to_string()),
            description_ddp: detail_col(&|d| safe_str(d.description.as_deref())),
            quantity_ddp: detail_col(&|d| safe_decimal_str(&d.quantity)),
            unit_price_ddp: detail_col(&|d| safe_decimal_str(&d.unit_price)),
            lea_value_ddp: detail_col(&|d| safe_decimal_str(&d.lea_value)),

            position_hoc: po_col(&|p| p.position.clone()),
            to_settle_hoc: po_col(&|p| safe_decimal_str(&p.to_settle)),
            order_class_hoc: po_col(&|p| safe_str(p.order_class.as_deref())),
            currency_hoc: po_col(&|p| safe_str(p.currency.as_deref())),
            trm_hoc: po_col(&|p| safe_decimal_str(&p.trm)),
            unit_price_hoc: po_col(&|p| safe_decimal_str(&p.unit_price)),
            quantity_hoc: po_col(&|p| safe_decimal_str(&p.quantity)),
            account_hoc: po_col(&|p| safe_str(p.account.as_deref())),
            tax_indicator_hoc: po_col(&|p| safe_str(p.tax_indicator.as_deref())),
            cost_center_hoc: po_col(&|p| safe_str(p.cost_center.as_deref())),
            internal_order_hoc: po_col(&|p| safe_str(p.internal_order.as_deref())),
            pep_element_hoc: po_col(&|p| safe_str(p.pep_element.as_deref())),
            fixed_asset_hoc: po_col(&|p| safe_str(p.fixed_asset.as_deref())),
            account_class_hoc: po_col(&|p| safe_str(p.account_class.as_deref())),
            supplier_name_hoc: po_col(&|p| safe_str(p.supplier_name.as_deref())),
            tax_class_hoc: po_col(&|p| safe_str(p.tax_class.as_deref())),
            short_text_hoc: po_col(&|p| safe_str(p.short_text.as_deref())),
            doc_date_hoc: po_col(&|p| safe_date_str(&p.doc_date)),

            detail_indices: join_pipe(
                &(0..details.len()).map(|i| i.to_string()).collect::<Vec<_>>(),
            ),
            po_indices: join_pipe(&chosen.iter().map(|i| i.to_string()).collect::<Vec<_>>()),
        }
    }

    pub fn key(&self) -> (String, String) {
        (self.supplier_id_dp.clone(), self.invoice_number_dp.clone())
    }

    /// 订单类别取第一个 OC 槽位
    pub fn order_class(&self) -> String {
        split_pipe(&self.order_class_hoc)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// 订单币种: OC 侧优先, 退回发票币种
    pub fn order_currency(&self) -> String {
        let po_cur = split_pipe(&self.currency_hoc)
            .into_iter()
            .find(|c| !is_vacant(c));
        po_cur.unwrap_or_else(|| self.currency_dp.clone())
    }

    pub fn is_usd(&self) -> bool {
        self.order_currency().eq_ignore_ascii_case("USD")
    }

    /// 付款条件是否为现金 (遗留值 "1" 或 "01")
    pub fn is_cash(&self) -> bool {
        matches!(self.payment_term_dp.trim(), "1" | "01")
    }

    pub fn po_slot_count(&self) -> usize {
        split_pipe(&self.position_hoc).len()
    }

    // 数值列 (单边解析, 解析失败得 0.0 由校验方归类)
    pub fn po_to_settle(&self) -> Vec<f64> {
        numbers(&self.to_settle_hoc)
    }

    pub fn po_trm(&self) -> Vec<f64> {
        numbers(&self.trm_hoc)
    }

    pub fn po_unit_prices(&self) -> Vec<f64> {
        numbers(&self.unit_price_hoc)
    }

    pub fn po_quantities(&self) -> Vec<f64> {
        numbers(&self.quantity_hoc)
    }

    pub fn detail_unit_prices(&self) -> Vec<f64> {
        numbers(&self.unit_price_ddp)
    }

    pub fn detail_quantities(&self) -> Vec<f64> {
        numbers(&self.quantity_ddp)
    }

    pub fn detail_lea_values(&self) -> Vec<f64> {
        numbers(&self.lea_value_ddp)
    }

    pub fn to_pay(&self) -> f64 {
        normalize_decimal(&self.to_pay_dp)
    }

    pub fn to_pay_cop(&self) -> f64 {
        normalize_decimal(&self.to_pay_cop_dp)
    }

    pub fn calc_rate(&self) -> f64 {
        normalize_decimal(&self.calc_rate_dp)
    }

    // 文本多值列
    pub fn positions(&self) -> Vec<String> {
        split_pipe(&self.position_hoc)
    }

    pub fn accounts(&self) -> Vec<String> {
        split_pipe(&self.account_hoc)
    }

    pub fn tax_indicators(&self) -> Vec<String> {
        split_pipe(&self.tax_indicator_hoc)
    }

    pub fn cost_centers(&self) -> Vec<String> {
        split_pipe(&self.cost_center_hoc)
    }

    pub fn internal_orders(&self) -> Vec<String> {
        split_pipe(&self.internal_order_hoc)
    }

    pub fn pep_elements(&self) -> Vec<String> {
        split_pipe(&self.pep_element_hoc)
    }

    pub fn fixed_assets(&self) -> Vec<String> {
        split_pipe(&self.fixed_asset_hoc)
    }

    pub fn account_classes(&self) -> Vec<String> {
        split_pipe(&self.account_class_hoc)
    }

    pub fn tax_classes(&self) -> Vec<String> {
        split_pipe(&self.tax_class_hoc)
    }

    pub fn supplier_names(&self) -> Vec<String> {
        split_pipe(&self.supplier_name_hoc)
    }

    pub fn short_texts(&self) -> Vec<String> {
        split_pipe(&self.short_text_hoc)
    }

    /// 首个 OC 供应商名 (阶段 3 使用)
    pub fn supplier_name_first(&self) -> String {
        self.supplier_names().into_iter().next().unwrap_or_default()
    }

    /// 任一槽位存在内部订单
    pub fn has_internal_order(&self) -> bool {
        self.internal_orders().iter().any(|v| !is_vacant(v))
    }

    /// 任一槽位存在 PEP 元素
    pub fn has_pep_element(&self) -> bool {
        self.pep_elements().iter().any(|v| !is_vacant(v))
    }

    /// 任一槽位存在固定资产
    pub fn has_fixed_asset(&self) -> bool {
        self.fixed_assets().iter().any(|v| !is_vacant(v))
    }
}

fn numbers(raw: &str) -> Vec<f64> {
    split_pipe(raw).iter().map(|v| normalize_decimal(v)).collect()
}
