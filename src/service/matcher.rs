use crate::config::EngineConfig;
use crate::db::{queries, staging};
use crate::error::ReconError;
use crate::models::{CandidateRecord, Disposition, InvoiceDoc, InvoiceLine, POLine, RunSummary};
use crate::normalize::is_vacant;
use crate::service::subset_sum::subset_sum;
use bigdecimal::ToPrimitive;
use sqlx::PgPool;

/// 单张发票的匹配结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// 选中的 OC 行下标 + 多解诊断计数
    Matched { chosen: Vec<usize>, ties: usize },
    /// 发票无订单号
    NoOrder,
    /// 无账本行或无明细行
    NotFound,
    /// 子集和无解
    NoCombination,
}

/// 候选匹配 (纯函数): 给定发票、明细与同 (供应商, 订单) 的未消费 OC 行,
/// 选出 to_settle 与发票明细总额在容差内对账的行子集。
pub fn match_invoice(
    inv: &InvoiceDoc,
    details: &[InvoiceLine],
    po_rows: &[POLine],
    tolerance: f64,
) -> MatchOutcome {
    if is_vacant(inv.order_number.as_deref().unwrap_or_default()) {
        return MatchOutcome::NoOrder;
    }

    // 已消费行不可再选 (上游查询已过滤, 这里再挡一次)
    let live: Vec<usize> = (0..po_rows.len())
        .filter(|&i| !po_rows[i].is_processed())
        .collect();
    let n_po = live.len();
    let n_det = details.len();
    if n_po == 0 || n_det == 0 {
        return MatchOutcome::NotFound;
    }

    if n_po <= n_det {
        return MatchOutcome::Matched {
            chosen: live,
            ties: 0,
        };
    }

    let to_settle: Vec<f64> = live
        .iter()
        .map(|&i| {
            po_rows[i]
                .to_settle
                .as_ref()
                .and_then(|d| d.to_f64())
                .unwrap_or(0.0)
        })
        .collect();
    let target: f64 = details
        .iter()
        .map(|d| d.lea_value.as_ref().and_then(|v| v.to_f64()).unwrap_or(0.0))
        .sum();

    match subset_sum(&to_settle, target, n_det, tolerance) {
        Some(result) => MatchOutcome::Matched {
            chosen: result.indices.iter().map(|&i| live[i]).collect(),
            ties: result.ties,
        },
        None => MatchOutcome::NoCombination,
    }
}

/// 匹配阶段: 扫描未处置的 FV 发票, 产出候选记录并写入暂存表。
/// 非匹配直接落处置 (NOT-FOUND / NO-COMBINATION); 按行异常计数后跳过。
pub async fn run_matcher(
    pool: &PgPool,
    engine: &EngineConfig,
    summary: &mut RunSummary,
) -> Result<Vec<CandidateRecord>, ReconError> {
    let invoices = queries::list_pending_fv_invoices(pool).await?;
    summary.total = invoices.len();
    tracing::info!("Matcher scanning {} pending FV invoices", invoices.len());

    let mut candidates = Vec::new();
    for (idx, inv) in invoices.iter().enumerate() {
        match match_one(pool, inv, engine.tolerance).await {
            Ok(MatchedInvoice::Candidate(cand, ties)) => {
                summary.candidates += 1;
                summary.ties += ties;
                candidates.push(cand);
            }
            Ok(MatchedInvoice::Terminal(disposition)) => match disposition {
                Disposition::NotFound => summary.not_found += 1,
                Disposition::NoCombination => summary.no_combination += 1,
                _ => summary.no_oc += 1,
            },
            Err(e) => {
                summary.errors += 1;
                tracing::error!(
                    "Candidate error for {}/{}: {}",
                    inv.supplier_id,
                    inv.invoice_number,
                    e
                );
            }
        }

        let current = idx + 1;
        if current % 100 == 0 || current == 1 {
            tracing::info!(
                "Matcher progress: {}/{}, candidates: {}",
                current,
                invoices.len(),
                summary.candidates
            );
        }
    }

    // 暂存表每轮重建 (全文本列, 异构来源防御)
    staging::recreate_candidate_table(pool).await?;
    staging::insert_candidates(pool, &candidates).await?;
    tracing::info!("Matcher staged {} candidate records", candidates.len());

    Ok(candidates)
}

enum MatchedInvoice {
    Candidate(CandidateRecord, usize),
    Terminal(Disposition),
}

async fn match_one(
    pool: &PgPool,
    inv: &InvoiceDoc,
    tolerance: f64,
) -> Result<MatchedInvoice, ReconError> {
    let details = queries::list_invoice_lines(pool, &inv.supplier_id, &inv.invoice_number).await?;
    let order = inv.order_number.clone().unwrap_or_default();
    let po_rows = if is_vacant(&order) {
        Vec::new()
    } else {
        queries::list_unprocessed_po_lines(pool, &inv.supplier_id, &order).await?
    };

    match match_invoice(inv, &details, &po_rows, tolerance) {
        MatchOutcome::Matched { chosen, ties } => {
            if ties > 0 {
                tracing::debug!(
                    "Subset-sum ties for {}/{}: {}",
                    inv.supplier_id,
                    inv.invoice_number,
                    ties
                );
            }
            Ok(MatchedInvoice::Candidate(
                CandidateRecord::from_parts(inv, &details, &po_rows, &chosen),
                ties,
            ))
        }
        MatchOutcome::NoOrder => {
            // 无 OC 的发票保持 WAITING, 仅计数
            queries::update_invoice_disposition(
                pool,
                &inv.supplier_id,
                &inv.invoice_number,
                &Disposition::Waiting.to_string(),
                inv.observation.as_deref().unwrap_or_default(),
            )
            .await?;
            Ok(MatchedInvoice::Terminal(Disposition::Waiting))
        }
        MatchOutcome::NotFound => {
            queries::update_invoice_disposition(
                pool,
                &inv.supplier_id,
                &inv.invoice_number,
                &Disposition::NotFound.to_string(),
                inv.observation.as_deref().unwrap_or_default(),
            )
            .await?;
            Ok(MatchedInvoice::Terminal(Disposition::NotFound))
        }
        MatchOutcome::NoCombination => {
            queries::update_invoice_disposition(
                pool,
                &inv.supplier_id,
                &inv.invoice_number,
                &Disposition::NoCombination.to_string(),
                inv.observation.as_deref().unwrap_or_default(),
            )
            .await?;
            Ok(MatchedInvoice::Terminal(Disposition::NoCombination))
        }
    }
}
