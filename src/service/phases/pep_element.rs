use super::{codes, field, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};
use crate::normalize::is_vacant;

pub const OBS_PEP_INDICATOR: &str = "Tax indicator not allowed for PEP element";
pub const OBS_PEP_COST_CENTER: &str = "Cost center must be empty for PEP element";
pub const OBS_PEP_ACCOUNT: &str = "Account does not match PEP element rule";
pub const OBS_PEP_PLACEMENT: &str = "PEP element missing on PO position";

/// 阶段 6 — PEP 元素分支 (ZPPA/ZPCN/42 且任一槽位有 PEP 元素)
///
/// 项目类指标 + 空成本中心 + 项目科目; 安置规则: 订单一旦携带 PEP,
/// 每个选中槽位都必须填有 PEP 元素。
pub struct PepElementPhase;

impl Phase for PepElementPhase {
    fn name(&self) -> &'static str {
        "pep_element"
    }

    fn applies(&self, cand: &CandidateRecord) -> bool {
        codes::BRANCH_CLASSES.contains(&cand.order_class().as_str()) && cand.has_pep_element()
    }

    fn run(&self, cand: &CandidateRecord, _ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let peps = cand.pep_elements();
        let indicators = cand.tax_indicators();
        let cost_centers = cand.cost_centers();
        let accounts = cand.accounts();
        let n = cand.po_slot_count();

        let mut pep_fc = FieldComparison::new(field::PEP_ELEMENT);
        let mut ind_fc = FieldComparison::new(field::TAX_INDICATOR);
        let mut cc_fc = FieldComparison::new(field::COST_CENTER);
        let mut acct_fc = FieldComparison::new(field::ACCOUNT);
        let mut failures: Vec<&'static str> = Vec::new();
        fn push_failure(msgs: &mut Vec<&'static str>, msg: &'static str) {
            if !msgs.contains(&msg) {
                msgs.push(msg);
            }
        }

        for i in 0..n {
            let pep = peps.get(i).cloned().unwrap_or_default();
            let ind = indicators.get(i).cloned().unwrap_or_default();
            let cc = cost_centers.get(i).cloned().unwrap_or_default();
            let account = accounts.get(i).cloned().unwrap_or_default();

            let placed = !is_vacant(&pep);
            let ind_ok = codes::PROJECT_INDICATORS.contains(&ind.as_str());
            let cc_ok = is_vacant(&cc);
            let acct_ok = account == codes::PROJECT_ACCOUNT;

            if !placed {
                push_failure(&mut failures, OBS_PEP_PLACEMENT);
            }
            if !ind_ok {
                push_failure(&mut failures, OBS_PEP_INDICATOR);
            }
            if !cc_ok {
                push_failure(&mut failures, OBS_PEP_COST_CENTER);
            }
            if !acct_ok {
                push_failure(&mut failures, OBS_PEP_ACCOUNT);
            }

            pep_fc.po_values.push(pep);
            pep_fc.xml_values.push(String::new());
            pep_fc.approvals.push(Approval::from_bool(placed));
            ind_fc.po_values.push(ind);
            ind_fc.xml_values.push(String::new());
            ind_fc.approvals.push(Approval::from_bool(ind_ok));
            cc_fc.po_values.push(cc);
            cc_fc.xml_values.push(String::new());
            cc_fc.approvals.push(Approval::from_bool(cc_ok));
            acct_fc.po_values.push(account);
            acct_fc.xml_values.push(String::new());
            acct_fc.approvals.push(Approval::from_bool(acct_ok));
        }

        out.record(pep_fc);
        out.record(ind_fc);
        out.record(cc_fc);
        out.record(acct_fc);
        if !failures.is_empty() {
            out.fail(cand, &failures.join(", "));
        }
    }
}
