use super::{codes, field, Phase, PhaseContext, PhaseOutcome};
use crate::models::{Approval, CandidateRecord, FieldComparison};
use crate::normalize::is_vacant;

pub const OBS_ORDER_INDICATOR: &str = "Tax indicator not allowed for internal order";
pub const OBS_ORDER_COST_CENTER: &str = "Cost center must be empty for internal order";
pub const OBS_ORDER_CC_REQUIRED: &str = "Cost center missing for statistical order";
pub const OBS_ORDER_ACCOUNT: &str = "Account does not match internal order rule";
pub const OBS_ORDER_ACCOUNT_CLASS: &str = "Account class does not match tax indicator";

/// 内部订单形态 (由首个非空订单串决定)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderKind {
    /// 9 位, 15 开头: 项目订单
    Project,
    /// 8 位, 53 开头: 统计订单
    Statistical,
    /// 8 位其余: 非统计订单
    NonStatistical,
    /// 10 位, 73 开头: 预算订单 (只查科目)
    Budget73,
    /// 其余形态不在分支内
    Other,
}

fn classify(order: &str) -> OrderKind {
    let o = order.trim();
    match (o.len(), o) {
        (9, o) if o.starts_with("15") => OrderKind::Project,
        (8, o) if o.starts_with("53") => OrderKind::Statistical,
        (8, _) => OrderKind::NonStatistical,
        (10, o) if o.starts_with("73") => OrderKind::Budget73,
        _ => OrderKind::Other,
    }
}

/// 非统计/预算订单的科目规则: 固定科目或 7 开头的 10 位科目
fn general_account_ok(account: &str) -> bool {
    account == codes::GENERAL_ACCOUNT || (account.starts_with('7') && account.len() == 10)
}

/// 指标决定允许的订单类别 (ZINV/ZADM)
fn account_class_ok(indicator: &str, class: &str) -> bool {
    match indicator {
        "H4" | "H5" => class == "ZINV",
        "H6" | "H7" => class == "ZADM",
        "VP" | "CO" | "CR" | "IC" => class == "ZINV" || class == "ZADM",
        _ => false,
    }
}

/// 阶段 5 — 内部订单分支 (ZPPA/ZPCN/42 且任一槽位有内部订单)
pub struct OrderBranchPhase;

impl Phase for OrderBranchPhase {
    fn name(&self) -> &'static str {
        "order_branch"
    }

    fn applies(&self, cand: &CandidateRecord) -> bool {
        codes::BRANCH_CLASSES.contains(&cand.order_class().as_str())
            && cand.has_internal_order()
    }

    fn run(&self, cand: &CandidateRecord, _ctx: &PhaseContext, out: &mut PhaseOutcome) {
        let orders = cand.internal_orders();
        let first_order = orders
            .iter()
            .find(|o| !is_vacant(o))
            .cloned()
            .unwrap_or_default();
        let kind = classify(&first_order);
        if kind == OrderKind::Other {
            tracing::debug!("Internal order {} has no branch, skipped", first_order);
            return;
        }

        let indicators = cand.tax_indicators();
        let cost_centers = cand.cost_centers();
        let accounts = cand.accounts();
        let account_classes = cand.account_classes();
        let n = cand.po_slot_count();

        let mut order_fc = FieldComparison::new(field::INTERNAL_ORDER);
        let mut ind_fc = FieldComparison::new(field::TAX_INDICATOR);
        let mut cc_fc = FieldComparison::new(field::COST_CENTER);
        let mut acct_fc = FieldComparison::new(field::ACCOUNT);
        let mut class_fc = FieldComparison::new(field::ACCOUNT_CLASS);
        let mut failures: Vec<&'static str> = Vec::new();
        fn push_failure(msgs: &mut Vec<&'static str>, msg: &'static str) {
            if !msgs.contains(&msg) {
                msgs.push(msg);
            }
        }

        for i in 0..n {
            let ind = indicators.get(i).cloned().unwrap_or_default();
            let cc = cost_centers.get(i).cloned().unwrap_or_default();
            let account = accounts.get(i).cloned().unwrap_or_default();
            let acct_class = account_classes.get(i).cloned().unwrap_or_default();

            let (ind_ok, cc_ok, acct_ok, class_ok) = match kind {
                OrderKind::Project => (
                    codes::PROJECT_INDICATORS.contains(&ind.as_str()),
                    is_vacant(&cc),
                    account == codes::PROJECT_ACCOUNT,
                    account_class_ok(&ind, &acct_class),
                ),
                OrderKind::Statistical => (true, !is_vacant(&cc), true, true),
                OrderKind::NonStatistical => {
                    (true, is_vacant(&cc), general_account_ok(&account), true)
                }
                OrderKind::Budget73 => (true, true, general_account_ok(&account), true),
                OrderKind::Other => unreachable!(),
            };

            if !ind_ok {
                push_failure(&mut failures, OBS_ORDER_INDICATOR);
            }
            if !cc_ok {
                let msg = if kind == OrderKind::Statistical {
                    OBS_ORDER_CC_REQUIRED
                } else {
                    OBS_ORDER_COST_CENTER
                };
                push_failure(&mut failures, msg);
            }
            if !acct_ok {
                push_failure(&mut failures, OBS_ORDER_ACCOUNT);
            }
            if !class_ok {
                push_failure(&mut failures, OBS_ORDER_ACCOUNT_CLASS);
            }

            order_fc.po_values.push(orders.get(i).cloned().unwrap_or_default());
            order_fc.xml_values.push(String::new());
            order_fc
                .approvals
                .push(Approval::from_bool(ind_ok && cc_ok && acct_ok && class_ok));
            ind_fc.po_values.push(ind);
            ind_fc.xml_values.push(String::new());
            ind_fc.approvals.push(Approval::from_bool(ind_ok));
            cc_fc.po_values.push(cc);
            cc_fc.xml_values.push(String::new());
            cc_fc.approvals.push(Approval::from_bool(cc_ok));
            acct_fc.po_values.push(account);
            acct_fc.xml_values.push(String::new());
            acct_fc.approvals.push(Approval::from_bool(acct_ok));
            class_fc.po_values.push(acct_class);
            class_fc.xml_values.push(String::new());
            class_fc.approvals.push(Approval::from_bool(class_ok));
        }

        out.record(order_fc);
        out.record(ind_fc);
        out.record(cc_fc);
        out.record(acct_fc);
        if kind == OrderKind::Project {
            out.record(class_fc);
        }
        if !failures.is_empty() {
            out.fail(cand, &failures.join(", "));
        }
    }
}
