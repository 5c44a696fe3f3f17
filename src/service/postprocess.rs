use crate::models::{CandidateRecord, Disposition};
use crate::service::phases::codes::TAX_CLASS_ZOMAC;

pub const OBS_TAX_CLASS_31: &str = "Document belongs to tax class 31 (ZOMAC-ZESE)";
pub const OBS_CASH_TERM: &str = "Document has cash payment term";

/// 后处理结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDecision {
    pub disposition: Disposition,
    /// 需要前插的观察 (None 表示不追加)
    pub observation_prefix: Option<&'static str>,
    /// 是否将选中 OC 行标记为 PROCESSED
    pub mark_processed: bool,
}

/// 后处理 — 两个全局折叠:
/// 1. OC 行带税类 31 (ZOMAC-ZESE): 新颖性加 EXCLUDED-ACCOUNTING 标注,
///    否则处置为 APPROVED-NO-ACCOUNTING
/// 2. 现金付款条件把 APPROVED 升级为 APPROVED-CASH
///
/// APPROVED* 族最终处置触发 OC 行消费标记。
pub fn apply(cand: &CandidateRecord, engine_disposition: &Disposition) -> PostDecision {
    let has_tax_31 = cand
        .tax_classes()
        .iter()
        .any(|t| t.trim() == TAX_CLASS_ZOMAC);

    if has_tax_31 {
        let disposition = if engine_disposition.is_novelty() {
            engine_disposition.clone().with_excluded_accounting()
        } else {
            Disposition::ApprovedNoAccounting
        };
        let mark = disposition.is_approved();
        return PostDecision {
            disposition,
            observation_prefix: Some(OBS_TAX_CLASS_31),
            mark_processed: mark,
        };
    }

    if engine_disposition.is_novelty() {
        return PostDecision {
            disposition: engine_disposition.clone(),
            observation_prefix: None,
            mark_processed: false,
        };
    }

    if cand.is_cash() {
        return PostDecision {
            disposition: Disposition::ApprovedCash,
            observation_prefix: Some(OBS_CASH_TERM),
            mark_processed: true,
        };
    }

    PostDecision {
        disposition: Disposition::Approved,
        observation_prefix: None,
        mark_processed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(tax_classes: &str, payment_term: &str) -> CandidateRecord {
        CandidateRecord {
            tax_class_hoc: tax_classes.into(),
            payment_term_dp: payment_term.into(),
            position_hoc: "10".into(),
            ..Default::default()
        }
    }

    #[test]
    fn plain_approval_marks_po_lines() {
        let d = apply(&cand("05|17", "2"), &Disposition::Approved);
        assert_eq!(d.disposition, Disposition::Approved);
        assert!(d.mark_processed);
        assert!(d.observation_prefix.is_none());
    }

    #[test]
    fn cash_term_upgrades_approved() {
        for term in ["1", "01"] {
            let d = apply(&cand("05", term), &Disposition::Approved);
            assert_eq!(d.disposition, Disposition::ApprovedCash);
            assert_eq!(d.observation_prefix, Some(OBS_CASH_TERM));
            assert!(d.mark_processed);
        }
    }

    #[test]
    fn tax_31_on_approved_excludes_accounting() {
        let d = apply(&cand("05|31|17", "2"), &Disposition::Approved);
        assert_eq!(d.disposition, Disposition::ApprovedNoAccounting);
        assert_eq!(d.observation_prefix, Some(OBS_TAX_CLASS_31));
        assert!(d.mark_processed);
    }

    #[test]
    fn tax_31_beats_cash_fold() {
        let d = apply(&cand("31", "01"), &Disposition::Approved);
        assert_eq!(d.disposition, Disposition::ApprovedNoAccounting);
    }

    #[test]
    fn tax_31_on_novelty_annotates() {
        let d = apply(&cand("31", "2"), &Disposition::WithNovelty);
        assert_eq!(d.disposition, Disposition::WithNoveltyExcluded);
        assert!(!d.mark_processed);

        let d = apply(&cand("31", "01"), &Disposition::WithNoveltyCash);
        assert_eq!(d.disposition, Disposition::WithNoveltyCashExcluded);
    }

    #[test]
    fn novelty_without_tax_31_is_unchanged() {
        let d = apply(&cand("05", "2"), &Disposition::WithNovelty);
        assert_eq!(d.disposition, Disposition::WithNovelty);
        assert!(!d.mark_processed);
        assert!(d.observation_prefix.is_none());
    }

    #[test]
    fn tax_31_requires_exact_segment() {
        // "310" 或 "131" 不算税类 31
        let d = apply(&cand("310|131", "2"), &Disposition::Approved);
        assert_eq!(d.disposition, Disposition::Approved);
    }
}
