use super::{codes, field, fmt_amount, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};

pub const OBS_PRICE_QTY_MISMATCH: &str =
    "Price or quantity mismatch between invoice lines and PO";

/// 阶段 4 — 逐行价格/数量校验 (ZPRE 族)
///
/// 第 i 个 OC 槽位对第 i 条发票明细; 槽位缺失按不通过处理。
pub struct PriceQtyPhase;

impl Phase for PriceQtyPhase {
    fn name(&self) -> &'static str {
        "price_qty"
    }

    fn applies(&self, cand: &CandidateRecord) -> bool {
        codes::PRICE_QTY_CLASSES.contains(&cand.order_class().as_str())
    }

    fn run(&self, cand: &CandidateRecord, ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let po_prices = cand.po_unit_prices();
        let po_qtys = cand.po_quantities();
        let det_prices = cand.detail_unit_prices();
        let det_qtys = cand.detail_quantities();
        let n = po_prices.len().max(det_prices.len());

        let mut prices = FieldComparison::new(field::UNIT_PRICE);
        let mut qtys = FieldComparison::new(field::QUANTITY);
        let mut any_bad = false;

        for i in 0..n {
            let price_ok = match (po_prices.get(i), det_prices.get(i)) {
                (Some(po), Some(det)) => (po - det).abs() <= ctx.tolerance,
                _ => false,
            };
            let qty_ok = match (po_qtys.get(i), det_qtys.get(i)) {
                (Some(po), Some(det)) => (po - det).abs() <= ctx.tolerance,
                _ => false,
            };
            prices
                .xml_values
                .push(det_prices.get(i).copied().map(fmt_amount).unwrap_or_default());
            prices
                .po_values
                .push(po_prices.get(i).copied().map(fmt_amount).unwrap_or_default());
            prices.approvals.push(Approval::from_bool(price_ok));
            qtys.xml_values
                .push(det_qtys.get(i).copied().map(fmt_amount).unwrap_or_default());
            qtys.po_values
                .push(po_qtys.get(i).copied().map(fmt_amount).unwrap_or_default());
            qtys.approvals.push(Approval::from_bool(qty_ok));
            any_bad |= !(price_ok && qty_ok);
        }

        out.record(prices);
        out.record(qtys);
        if any_bad {
            out.fail(cand, OBS_PRICE_QTY_MISMATCH);
        }
    }
}
