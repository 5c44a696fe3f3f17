use super::{codes, field, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};
use crate::normalize::is_vacant;

pub const OBS_GEN_INDICATOR_MISSING: &str = "Tax indicator not diligent";
pub const OBS_GEN_COST_CENTER_MISSING: &str = "Cost center not diligent";
pub const OBS_GEN_INDICATOR_NOT_ALLOWED: &str = "Tax indicator not allowed for cost center";

/// 阶段 8 — 一般分支 (ZPPA/ZPCN/42 且无内部订单/PEP/固定资产)
///
/// 指标与成本中心必须填写, 且指标在参考表允许集合内;
/// 参考表缺失该成本中心时视为有效 (开放世界策略)。
pub struct GeneralsPhase;

impl Phase for GeneralsPhase {
    fn name(&self) -> &'static str {
        "generals"
    }

    fn applies(&self, cand: &CandidateRecord) -> bool {
        codes::BRANCH_CLASSES.contains(&cand.order_class().as_str())
            && !cand.has_internal_order()
            && !cand.has_pep_element()
            && !cand.has_fixed_asset()
    }

    fn run(&self, cand: &CandidateRecord, ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let indicators = cand.tax_indicators();
        let cost_centers = cand.cost_centers();
        let n = cand.po_slot_count();

        let mut ind_fc = FieldComparison::new(field::TAX_INDICATOR);
        let mut cc_fc = FieldComparison::new(field::COST_CENTER);
        let mut failures: Vec<&'static str> = Vec::new();
        fn push_failure(msgs: &mut Vec<&'static str>, msg: &'static str) {
            if !msgs.contains(&msg) {
                msgs.push(msg);
            }
        }

        for i in 0..n {
            let ind = indicators.get(i).cloned().unwrap_or_default();
            let cc = cost_centers.get(i).cloned().unwrap_or_default();

            let ind_filled = !is_vacant(&ind);
            let cc_filled = !is_vacant(&cc);
            let allowed = ind_filled && cc_filled && ctx.reference.is_allowed(&cc, &ind);

            if !ind_filled {
                push_failure(&mut failures, OBS_GEN_INDICATOR_MISSING);
            }
            if !cc_filled {
                push_failure(&mut failures, OBS_GEN_COST_CENTER_MISSING);
            }
            if ind_filled && cc_filled && !allowed {
                push_failure(&mut failures, OBS_GEN_INDICATOR_NOT_ALLOWED);
            }

            ind_fc.po_values.push(ind);
            ind_fc.xml_values.push(String::new());
            ind_fc.approvals.push(Approval::from_bool(allowed));
            cc_fc.po_values.push(cc);
            cc_fc.xml_values.push(String::new());
            cc_fc.approvals.push(Approval::from_bool(cc_filled));
        }

        out.record(ind_fc);
        out.record(cc_fc);
        if !failures.is_empty() {
            out.fail(cand, &failures.join(", "));
        }
    }
}
