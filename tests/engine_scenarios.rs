//! 端到端场景: 纯流水线 (阶段引擎 -> 后处理 -> 槽位规划),
//! 数据层换成内存构造的候选记录。

use po_recon_rust::models::{CandidateRecord, Disposition};
use po_recon_rust::reference::TaxIndicatorTable;
use po_recon_rust::service::mirror::plan_field_upsert;
use po_recon_rust::service::phases::{PhaseContext, PhaseEngine};
use po_recon_rust::service::postprocess;

fn engine() -> PhaseEngine {
    engine_with_reference(TaxIndicatorTable::default())
}

fn engine_with_reference(reference: TaxIndicatorTable) -> PhaseEngine {
    PhaseEngine::new(PhaseContext {
        tolerance: 500.0,
        trm_tolerance: 10.0,
        reference,
    })
}

fn base_candidate() -> CandidateRecord {
    CandidateRecord {
        supplier_id_dp: "800123456".into(),
        invoice_number_dp: "FE-1001".into(),
        doc_type_dp: "FV".into(),
        order_number_dp: "4500001234".into(),
        issuer_name_dp: "ACME SAS".into(),
        currency_dp: "COP".into(),
        payment_term_dp: "2".into(),
        to_pay_dp: "10000".into(),
        position_hoc: "10".into(),
        to_settle_hoc: "10050".into(),
        currency_hoc: "COP".into(),
        supplier_name_hoc: "ACME S.A.S.".into(),
        tax_class_hoc: "05".into(),
        ..Default::default()
    }
}

#[test]
fn exact_cop_match_is_approved() {
    let cand = base_candidate();
    let outcome = engine().run(&cand);
    assert_eq!(outcome.disposition, Disposition::Approved);
    assert!(outcome.comparisons["total_value"].all_approved());

    let decision = postprocess::apply(&cand, &outcome.disposition);
    assert_eq!(decision.disposition, Disposition::Approved);
    assert!(decision.mark_processed);
}

#[test]
fn cash_payment_term_upgrades_to_approved_cash() {
    let mut cand = base_candidate();
    cand.payment_term_dp = "01".into();
    let outcome = engine().run(&cand);
    assert_eq!(outcome.disposition, Disposition::Approved);

    let decision = postprocess::apply(&cand, &outcome.disposition);
    assert_eq!(decision.disposition, Disposition::ApprovedCash);
    assert_eq!(
        decision.observation_prefix,
        Some("Document has cash payment term")
    );
    assert!(decision.mark_processed);
}

#[test]
fn usd_trm_mismatch_is_with_novelty() {
    let mut cand = base_candidate();
    cand.currency_hoc = "USD".into();
    cand.to_pay_cop_dp = "40000".into();
    cand.calc_rate_dp = "4000".into();
    cand.to_settle_hoc = "40000".into();
    cand.trm_hoc = "3900".into();

    let outcome = engine().run(&cand);
    assert_eq!(outcome.disposition, Disposition::WithNovelty);
    assert!(outcome
        .observation
        .starts_with("No TRM match between invoice and PO"));
    assert!(!outcome.comparisons["trm"].all_approved());
    // 总值阶段按 COP 等值比较, 仍然通过
    assert!(outcome.comparisons["total_value"].all_approved());
}

#[test]
fn normalized_issuer_names_accept() {
    let mut cand = base_candidate();
    cand.order_class_hoc = "ZPPA".into();
    cand.issuer_name_dp = "Angel & DG Ltda.".into();
    cand.supplier_name_hoc = "ANGEL Y DG LTDA".into();
    // 一般分支需要指标与成本中心填写
    cand.tax_indicator_hoc = "H4".into();
    cand.cost_center_hoc = "12345".into();

    let outcome = engine().run(&cand);
    assert_eq!(outcome.disposition, Disposition::Approved);
    assert!(outcome.comparisons["issuer_name"].all_approved());
}

#[test]
fn novelty_is_monotonic_across_later_phases() {
    // 发行方不匹配 -> 新颖性; 后续一般分支通过也不得回升
    let mut cand = base_candidate();
    cand.order_class_hoc = "ZPPA".into();
    cand.issuer_name_dp = "OTRA EMPRESA SAS".into();
    cand.tax_indicator_hoc = "H4".into();
    cand.cost_center_hoc = "12345".into();

    let outcome = engine().run(&cand);
    assert_eq!(outcome.disposition, Disposition::WithNovelty);
    assert!(outcome.comparisons["tax_indicator"].all_approved());
}

#[test]
fn tax_class_31_upgrades_approved_to_no_accounting() {
    let mut cand = base_candidate();
    cand.tax_class_hoc = "05|31|17".into();
    let outcome = engine().run(&cand);
    assert_eq!(outcome.disposition, Disposition::Approved);

    let decision = postprocess::apply(&cand, &outcome.disposition);
    assert_eq!(decision.disposition, Disposition::ApprovedNoAccounting);
    assert_eq!(
        decision.observation_prefix,
        Some("Document belongs to tax class 31 (ZOMAC-ZESE)")
    );
}

#[test]
fn tax_class_31_annotates_novelty() {
    let mut cand = base_candidate();
    cand.tax_class_hoc = "31".into();
    cand.to_settle_hoc = "99999".into(); // 总值不匹配

    let outcome = engine().run(&cand);
    assert_eq!(outcome.disposition, Disposition::WithNovelty);

    let decision = postprocess::apply(&cand, &outcome.disposition);
    assert_eq!(decision.disposition, Disposition::WithNoveltyExcluded);
    assert_eq!(
        decision.disposition.to_string(),
        "WITH-NOVELTY/EXCLUDED-ACCOUNTING"
    );
    assert!(!decision.mark_processed);
}

#[test]
fn pipeline_is_idempotent_on_same_candidate() {
    let mut cand = base_candidate();
    cand.order_class_hoc = "ZPPA".into();
    cand.tax_indicator_hoc = "H4".into();
    cand.cost_center_hoc = "12345".into();

    let engine = engine();
    let first = engine.run(&cand);
    let second = engine.run(&cand);
    assert_eq!(first.disposition, second.disposition);
    assert_eq!(first.observation, second.observation);
    assert_eq!(first.comparisons, second.comparisons);

    // 槽位重规划也稳定: 第一轮插入的槽位第二轮全部转为原地更新
    for fc in first.comparisons.values() {
        let fresh = plan_field_upsert(0, fc);
        let replay = plan_field_upsert(fc.slot_count() as i64, fc);
        assert_eq!(replay.updates, fresh.inserts);
        assert!(replay.inserts.is_empty());
    }
}

#[test]
fn observation_is_bounded_before_persistence() {
    let mut cand = base_candidate();
    cand.order_class_hoc = "ZPPA".into();
    cand.issuer_name_dp = "X".into();
    cand.to_settle_hoc = "99999".into();
    cand.tax_indicator_hoc = "none".into();

    let outcome = engine().run(&cand);
    assert!(outcome.bounded_observation().chars().count() <= 3900);
    assert_eq!(outcome.disposition, Disposition::WithNovelty);
}

#[test]
fn generals_branch_uses_reference_table() {
    let sheet = "CECO,Codigo Ind. Iva aplicable\n12345,H4-H5\n";
    let reference = TaxIndicatorTable::from_reader(sheet.as_bytes()).unwrap();

    let mut cand = base_candidate();
    cand.order_class_hoc = "ZPPA".into();
    cand.tax_indicator_hoc = "VP".into();
    cand.cost_center_hoc = "12345".into();

    let outcome = engine_with_reference(reference).run(&cand);
    assert_eq!(outcome.disposition, Disposition::WithNovelty);
    assert!(outcome
        .observation
        .contains("Tax indicator not allowed for cost center"));
}
