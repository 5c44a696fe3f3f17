use super::{codes, field, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};
use crate::normalize::company_names_match;

pub const OBS_ISSUER_MISMATCH: &str = "Issuer name does not match PO supplier";

/// 阶段 3 — 发行方名称校验
///
/// 发票发行方与 OC 首槽供应商名按规范化词集合比较 (相等, 非子集)。
pub struct IssuerNamePhase;

impl Phase for IssuerNamePhase {
    fn name(&self) -> &'static str {
        "issuer_name"
    }

    fn applies(&self, cand: &CandidateRecord) -> bool {
        codes::ISSUER_CLASSES.contains(&cand.order_class().as_str())
    }

    fn run(&self, cand: &CandidateRecord, _ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let invoice_name = cand.issuer_name_dp.clone();
        let po_name = cand.supplier_name_first();
        let ok = company_names_match(&invoice_name, &po_name);

        out.record(FieldComparison {
            field: field::ISSUER_NAME.to_string(),
            xml_values: vec![invoice_name],
            po_values: vec![po_name],
            approvals: vec![Approval::from_bool(ok)],
        });
        if !ok {
            out.fail(cand, OBS_ISSUER_MISMATCH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Disposition;

    fn cand(issuer: &str, supplier: &str, class: &str) -> CandidateRecord {
        CandidateRecord {
            payment_term_dp: "2".into(),
            issuer_name_dp: issuer.into(),
            supplier_name_hoc: supplier.into(),
            order_class_hoc: class.into(),
            position_hoc: "10".into(),
            ..Default::default()
        }
    }

    #[test]
    fn applies_only_to_listed_classes() {
        assert!(IssuerNamePhase.applies(&cand("A", "A", "ZPRE")));
        assert!(IssuerNamePhase.applies(&cand("A", "A", "45")));
        assert!(!IssuerNamePhase.applies(&cand("A", "A", "ZPSA")));
        assert!(!IssuerNamePhase.applies(&cand("A", "A", "43")));
    }

    #[test]
    fn normalized_names_accept() {
        let mut out = PhaseOutcome::new();
        IssuerNamePhase.run(
            &cand("Angel & DG Ltda.", "ANGEL Y DG LTDA", "ZPPA"),
            &PhaseContext::default(),
            &mut out,
        );
        assert_eq!(out.disposition, Disposition::Approved);
        assert!(out.comparisons["issuer_name"].all_approved());
    }

    #[test]
    fn subset_names_reject() {
        let mut out = PhaseOutcome::new();
        IssuerNamePhase.run(
            &cand("ANGEL DG LTDA", "ANGEL DG LTDA BOGOTA", "ZPPA"),
            &PhaseContext::default(),
            &mut out,
        );
        assert_eq!(out.disposition, Disposition::WithNovelty);
        assert_eq!(out.observation, OBS_ISSUER_MISMATCH);
    }
}
