use super::{field, fmt_amount, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};

pub const OBS_NO_TRM_MATCH: &str = "No TRM match between invoice and PO";

/// 阶段 2 — TRM 校验 (仅 USD 订单)
///
/// 发票换算汇率与 OC 首槽 TRM 之差不得超过 trm_tolerance。
pub struct TrmPhase;

impl Phase for TrmPhase {
    fn name(&self) -> &'static str {
        "trm"
    }

    fn applies(&self, cand: &CandidateRecord) -> bool {
        cand.is_usd()
    }

    fn run(&self, cand: &CandidateRecord, ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let invoice_rate = cand.calc_rate();
        let po_rate = cand.po_trm().first().copied().unwrap_or(0.0);
        let ok = (invoice_rate - po_rate).abs() <= ctx.trm_tolerance;

        out.record(FieldComparison {
            field: field::TRM.to_string(),
            xml_values: vec![fmt_amount(invoice_rate)],
            po_values: vec![fmt_amount(po_rate)],
            approvals: vec![Approval::from_bool(ok)],
        });
        if !ok {
            out.fail(cand, OBS_NO_TRM_MATCH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Disposition;

    fn usd_cand(rate: &str, trm: &str) -> CandidateRecord {
        CandidateRecord {
            payment_term_dp: "2".into(),
            currency_hoc: "USD".into(),
            position_hoc: "10".into(),
            calc_rate_dp: rate.into(),
            trm_hoc: trm.into(),
            ..Default::default()
        }
    }

    #[test]
    fn skipped_for_cop_orders() {
        let c = CandidateRecord {
            currency_hoc: "COP".into(),
            ..Default::default()
        };
        assert!(!TrmPhase.applies(&c));
    }

    #[test]
    fn within_tolerance_passes() {
        let ctx = PhaseContext {
            trm_tolerance: 10.0,
            ..Default::default()
        };
        let mut out = PhaseOutcome::new();
        TrmPhase.run(&usd_cand("4000", "3995"), &ctx, &mut out);
        assert_eq!(out.disposition, Disposition::Approved);
    }

    #[test]
    fn mismatch_prepends_trm_observation() {
        let ctx = PhaseContext {
            trm_tolerance: 10.0,
            ..Default::default()
        };
        let mut out = PhaseOutcome::new();
        out.note("earlier");
        TrmPhase.run(&usd_cand("4000", "3900"), &ctx, &mut out);
        assert_eq!(out.disposition, Disposition::WithNovelty);
        assert_eq!(out.observation, format!("{OBS_NO_TRM_MATCH}, earlier"));
    }
}
