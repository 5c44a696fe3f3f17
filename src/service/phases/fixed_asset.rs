use super::{codes, field, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};
use crate::normalize::is_vacant;

pub const OBS_FA_INDICATOR: &str = "Tax indicator not allowed for fixed asset";
pub const OBS_FA_COST_CENTER: &str = "Cost center must be empty for fixed asset";
pub const OBS_FA_ACCOUNT: &str = "Account does not match fixed asset rule";

/// 固定资产形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetKind {
    /// 10 位, 2000 开头: 递延
    Deferred,
    /// 9 位, 8000 开头: 债券
    Bond,
    /// 其余形态跳过
    Other,
}

fn classify(asset: &str) -> AssetKind {
    let a = asset.trim();
    match (a.len(), a) {
        (10, a) if a.starts_with("2000") => AssetKind::Deferred,
        (9, a) if a.starts_with("8000") => AssetKind::Bond,
        _ => AssetKind::Other,
    }
}

/// 阶段 7 — 固定资产分支 (ZPPA/ZPCN/42 且任一槽位有固定资产)
pub struct FixedAssetPhase;

impl Phase for FixedAssetPhase {
    fn name(&self) -> &'static str {
        "fixed_asset"
    }

    fn applies(&self, cand: &CandidateRecord) -> bool {
        codes::BRANCH_CLASSES.contains(&cand.order_class().as_str()) && cand.has_fixed_asset()
    }

    fn run(&self, cand: &CandidateRecord, _ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let assets = cand.fixed_assets();
        let indicators = cand.tax_indicators();
        let cost_centers = cand.cost_centers();
        let accounts = cand.accounts();
        let n = cand.po_slot_count();

        let mut fa_fc = FieldComparison::new(field::FIXED_ASSET);
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
            let asset = assets.get(i).cloned().unwrap_or_default();
            let ind = indicators.get(i).cloned().unwrap_or_default();
            let cc = cost_centers.get(i).cloned().unwrap_or_default();
            let account = accounts.get(i).cloned().unwrap_or_default();

            // 空槽或未识别形态不参与校验
            let kind = if is_vacant(&asset) {
                AssetKind::Other
            } else {
                classify(&asset)
            };
            let allowed: Option<&[&str]> = match kind {
                AssetKind::Deferred => Some(&codes::DEFERRED_FA_INDICATORS),
                AssetKind::Bond => Some(&codes::BOND_FA_INDICATORS),
                AssetKind::Other => None,
            };

            let (ind_ok, cc_ok, acct_ok) = match allowed {
                Some(set) => (
                    set.contains(&ind.as_str()),
                    is_vacant(&cc),
                    account == codes::DEFERRED_ACCOUNT,
                ),
                None => (true, true, true),
            };

            if !ind_ok {
                push_failure(&mut failures, OBS_FA_INDICATOR);
            }
            if !cc_ok {
                push_failure(&mut failures, OBS_FA_COST_CENTER);
            }
            if !acct_ok {
                push_failure(&mut failures, OBS_FA_ACCOUNT);
            }

            fa_fc.po_values.push(asset);
            fa_fc.xml_values.push(String::new());
            fa_fc
                .approvals
                .push(Approval::from_bool(ind_ok && cc_ok && acct_ok));
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

        out.record(fa_fc);
        out.record(ind_fc);
        out.record(cc_fc);
        out.record(acct_fc);
        if !failures.is_empty() {
            out.fail(cand, &failures.join(", "));
        }
    }
}
