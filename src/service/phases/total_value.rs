use super::{field, fmt_amount, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};

pub const OBS_NO_VALUE_MATCH: &str = "No value match between invoice and PO";

/// 阶段 1 — 总值校验 (永远适用)
///
/// COP 订单比 to_pay, USD 订单比 to_pay_cop; OC 侧取选中行 to_settle 之和。
pub struct TotalValuePhase;

impl Phase for TotalValuePhase {
    fn name(&self) -> &'static str {
        "total_value"
    }

    fn applies(&self, _cand: &CandidateRecord) -> bool {
        true
    }

    fn run(&self, cand: &CandidateRecord, ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let po_sum: f64 = cand.po_to_settle().iter().sum();
        let invoice_total = if cand.is_usd() {
            cand.to_pay_cop()
        } else {
            cand.to_pay()
        };
        let ok = (po_sum - invoice_total).abs() <= ctx.tolerance;

        out.record(FieldComparison {
            field: field::TOTAL_VALUE.to_string(),
            xml_values: vec![fmt_amount(invoice_total)],
            po_values: vec![fmt_amount(po_sum)],
            approvals: vec![Approval::from_bool(ok)],
        });
        if !ok {
            out.fail(cand, OBS_NO_VALUE_MATCH);
        }
    }
}
