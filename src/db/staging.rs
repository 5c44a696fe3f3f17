use crate::models::CandidateRecord;
use sqlx::PgPool;

/// 暂存表列 (与 CandidateRecord 字段一一对应; 全部无界文本 — 异构来源防御)
const CANDIDATE_COLUMNS: [&str; 35] = [
    "supplier_id_dp",
    "invoice_number_dp",
    "doc_type_dp",
    "order_number_dp",
    "issuer_name_dp",
    "currency_dp",
    "payment_term_dp",
    "to_pay_dp",
    "to_pay_cop_dp",
    "calc_rate_dp",
    "issue_date_dp",
    "line_seq_ddp",
    "description_ddp",
    "quantity_ddp",
    "unit_price_ddp",
    "lea_value_ddp",
    "position_hoc",
    "to_settle_hoc",
    "order_class_hoc",
    "currency_hoc",
    "trm_hoc",
    "unit_price_hoc",
    "quantity_hoc",
    "account_hoc",
    "tax_indicator_hoc",
    "cost_center_hoc",
    "internal_order_hoc",
    "pep_element_hoc",
    "fixed_asset_hoc",
    "account_class_hoc",
    "supplier_name_hoc",
    "tax_class_hoc",
    "short_text_hoc",
    "doc_date_hoc",
    "detail_indices",
];

/// 暂存表每轮丢弃重建
pub async fn recreate_candidate_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP TABLE IF EXISTS t_candidate_stage")
        .execute(pool)
        .await?;

    let columns: Vec<String> = CANDIDATE_COLUMNS
        .iter()
        .map(|c| format!("{c} TEXT"))
        .chain(std::iter::once("po_indices TEXT".to_string()))
        .collect();
    let ddl = format!("CREATE TABLE t_candidate_stage ({})", columns.join(", "));
    sqlx::query(&ddl).execute(pool).await?;
    tracing::info!("Candidate staging table recreated");
    Ok(())
}

/// 批量插入候选记录 (每1000条分块, 30秒超时)
pub async fn insert_candidates(
    pool: &PgPool,
    candidates: &[CandidateRecord],
) -> Result<(), sqlx::Error> {
    if candidates.is_empty() {
        return Ok(());
    }

    for chunk in candidates.chunks(1000) {
        let mut query_builder = sqlx::QueryBuilder::new(format!(
            "INSERT INTO t_candidate_stage ({}, po_indices) ",
            CANDIDATE_COLUMNS.join(", ")
        ));

        query_builder.push_values(chunk, |mut b, c| {
            b.push_bind(&c.supplier_id_dp)
                .push_bind(&c.invoice_number_dp)
                .push_bind(&c.doc_type_dp)
                .push_bind(&c.order_number_dp)
                .push_bind(&c.issuer_name_dp)
                .push_bind(&c.currency_dp)
                .push_bind(&c.payment_term_dp)
                .push_bind(&c.to_pay_dp)
                .push_bind(&c.to_pay_cop_dp)
                .push_bind(&c.calc_rate_dp)
                .push_bind(&c.issue_date_dp)
                .push_bind(&c.line_seq_ddp)
                .push_bind(&c.description_ddp)
                .push_bind(&c.quantity_ddp)
                .push_bind(&c.unit_price_ddp)
                .push_bind(&c.lea_value_ddp)
                .push_bind(&c.position_hoc)
                .push_bind(&c.to_settle_hoc)
                .push_bind(&c.order_class_hoc)
                .push_bind(&c.currency_hoc)
                .push_bind(&c.trm_hoc)
                .push_bind(&c.unit_price_hoc)
                .push_bind(&c.quantity_hoc)
                .push_bind(&c.account_hoc)
                .push_bind(&c.tax_indicator_hoc)
                .push_bind(&c.cost_center_hoc)
                .push_bind(&c.internal_order_hoc)
                .push_bind(&c.pep_element_hoc)
                .push_bind(&c.fixed_asset_hoc)
                .push_bind(&c.account_class_hoc)
                .push_bind(&c.supplier_name_hoc)
                .push_bind(&c.tax_class_hoc)
                .push_bind(&c.short_text_hoc)
                .push_bind(&c.doc_date_hoc)
                .push_bind(&c.detail_indices)
                .push_bind(&c.po_indices);
        });

        let execute_result = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            query_builder.build().execute(pool),
        )
        .await;

        match execute_result {
            Ok(Ok(result)) => {
                tracing::debug!("Staged {} candidate rows", result.rows_affected());
            }
            Ok(Err(e)) => {
                tracing::error!("Candidate staging insert failed: {:?}", e);
                return Err(e);
            }
            Err(_) => {
                tracing::error!("Candidate staging insert timed out (>30s)");
                return Err(sqlx::Error::PoolTimedOut);
            }
        }
    }
    Ok(())
}
