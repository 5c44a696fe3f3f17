use crate::db::queries;
use crate::error::ReconError;
use crate::models::{CandidateRecord, FieldComparison, PROCESSED};
use crate::normalize::{split_pipe, truncate_observation};
use crate::service::phases::PhaseOutcome;
use crate::service::postprocess::PostDecision;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

/// 批量写失败的重试次数与退避基数
const WRITE_RETRIES: u32 = 3;
const WRITE_BACKOFF: Duration = Duration::from_millis(500);

/// 一个槽位的写入内容; None 的列保持原值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWrite {
    pub slot_index: i32,
    pub xml_value: Option<String>,
    pub po_value: Option<String>,
    pub approval: Option<String>,
}

/// 槽位写入计划: 前 min(c, n) 槽位原地更新, 其余插入; 多出的旧槽位不删
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotPlan {
    pub updates: Vec<SlotWrite>,
    pub inserts: Vec<SlotWrite>,
}

/// 按升级协议为一个字段规划槽位写入
pub fn plan_field_upsert(existing: i64, fc: &FieldComparison) -> SlotPlan {
    let n = fc.slot_count();
    let mut plan = SlotPlan::default();
    for i in 0..n {
        let write = SlotWrite {
            slot_index: (i + 1) as i32,
            xml_value: Some(fc.xml_values.get(i).cloned().unwrap_or_default()),
            po_value: Some(fc.po_values.get(i).cloned().unwrap_or_default()),
            approval: Some(
                fc.approvals
                    .get(i)
                    .map(|a| a.as_str().to_string())
                    .unwrap_or_default(),
            ),
        };
        if (i as i64) < existing {
            plan.updates.push(write);
        } else {
            plan.inserts.push(write);
        }
    }
    plan
}

/// 把一张发票的全部决定镜像到两个输出存储:
/// 处置表 (一行, 原地更新) 与对比表 (每字段每槽位一行)。
/// APPROVED* 最终态同时消费 OC 行。
pub async fn persist_decision(
    tx: &mut Transaction<'_, Postgres>,
    cand: &CandidateRecord,
    outcome: &PhaseOutcome,
    decision: &PostDecision,
) -> Result<(), ReconError> {
    let disposition = decision.disposition.to_string();

    // 观察: 后处理前插 + 截断后入库
    let mut observation = outcome.observation.clone();
    if let Some(prefix) = decision.observation_prefix {
        observation = if observation.is_empty() {
            prefix.to_string()
        } else {
            format!("{prefix}, {observation}")
        };
    }
    let observation = truncate_observation(&observation);

    queries::update_invoice_disposition_tx(
        tx,
        &cand.supplier_id_dp,
        &cand.invoice_number_dp,
        &disposition,
        &observation,
    )
    .await?;

    for fc in outcome.comparisons.values() {
        let existing = queries::count_slots(
            tx,
            &cand.supplier_id_dp,
            &cand.invoice_number_dp,
            &fc.field,
        )
        .await?;
        let plan = plan_field_upsert(existing, fc);
        for w in &plan.updates {
            queries::update_slot(tx, &cand.supplier_id_dp, &cand.invoice_number_dp, &fc.field, w)
                .await?;
        }
        for w in &plan.inserts {
            queries::insert_slot(
                tx,
                &cand.supplier_id_dp,
                &cand.invoice_number_dp,
                &fc.field,
                w,
                &disposition,
            )
            .await?;
        }
    }

    // 处置传播到该发票的所有对比行
    queries::propagate_disposition_to_slots(
        tx,
        &cand.supplier_id_dp,
        &cand.invoice_number_dp,
        &disposition,
    )
    .await?;

    if decision.mark_processed {
        let to_settle = split_pipe(&cand.to_settle_hoc);
        let short_texts = cand.short_texts();
        for (i, settle) in to_settle.iter().enumerate() {
            queries::mark_po_processed(
                tx,
                &cand.order_number_dp,
                &cand.supplier_id_dp,
                settle,
                short_texts.get(i).map(|s| s.as_str()).unwrap_or_default(),
                PROCESSED,
            )
            .await?;
        }
    }

    Ok(())
}

/// 整张发票的写入跑在一个事务里; 失败回滚并按 0.5s × 次数退避重试,
/// 重试耗尽后传播 PersistError。
pub async fn persist_with_retry(
    pool: &PgPool,
    cand: &CandidateRecord,
    outcome: &PhaseOutcome,
    decision: &PostDecision,
) -> Result<(), ReconError> {
    let mut last_err: Option<ReconError> = None;
    for attempt in 1..=WRITE_RETRIES {
        let mut tx = pool.begin().await.map_err(ReconError::PersistError)?;
        match persist_decision(&mut tx, cand, outcome, decision).await {
            Ok(()) => {
                tx.commit().await.map_err(ReconError::PersistError)?;
                return Ok(());
            }
            Err(e) => {
                // drop(tx) 即回滚; 部分更新不外泄
                drop(tx);
                tracing::warn!(
                    "Persist attempt {}/{} failed for {}/{}: {}",
                    attempt,
                    WRITE_RETRIES,
                    cand.supplier_id_dp,
                    cand.invoice_number_dp,
                    e
                );
                last_err = Some(e);
                if attempt < WRITE_RETRIES {
                    tokio::time::sleep(WRITE_BACKOFF * attempt).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        ReconError::CandidateError {
            supplier_id: cand.supplier_id_dp.clone(),
            invoice_number: cand.invoice_number_dp.clone(),
            detail: "persist retries exhausted without an error".into(),
        }
    }))
}
