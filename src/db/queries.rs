use crate::models::{ComparisonSlot, InvoiceDoc, InvoiceLine, POLine};
use crate::service::mirror::SlotWrite;
use sqlx::{PgPool, Postgres, Transaction};
use std::path::Path;

const INVOICE_COLUMNS: &str = "supplier_id, invoice_number, doc_type, order_number, \
     issuer_name, currency, payment_term, to_pay, to_pay_cop, calc_rate, issue_date, \
     disposition, observation";

/// 查询待处置的 FV 发票 (处置为空)
pub async fn list_pending_fv_invoices(pool: &PgPool) -> Result<Vec<InvoiceDoc>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceDoc>(&format!(
        r#"
        SELECT {INVOICE_COLUMNS}
        FROM t_invoice_doc
        WHERE doc_type = 'FV'
          AND (disposition IS NULL OR disposition = '')
        ORDER BY supplier_id, invoice_number
        "#
    ))
    .fetch_all(pool)
    .await
}

/// 查询发票明细
pub async fn list_invoice_lines(
    pool: &PgPool,
    supplier_id: &str,
    invoice_number: &str,
) -> Result<Vec<InvoiceLine>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceLine>(
        r#"
        SELECT supplier_id, invoice_number, line_seq, description,
               quantity, unit_price, lea_value
        FROM t_invoice_line
        WHERE supplier_id = $1 AND invoice_number = $2
        ORDER BY line_seq
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .fetch_all(pool)
    .await
}

/// 查询同 (供应商, 订单) 的未消费 OC 行
pub async fn list_unprocessed_po_lines(
    pool: &PgPool,
    supplier_id: &str,
    order_number: &str,
) -> Result<Vec<POLine>, sqlx::Error> {
    sqlx::query_as::<_, POLine>(
        r#"
        SELECT supplier_id, order_number, position, supplier_name, order_class,
               currency, to_settle, trm, unit_price, quantity, account,
               tax_indicator, cost_center, internal_order, pep_element,
               fixed_asset, account_class, tax_class, short_text, doc_date, processed
        FROM t_po_ledger
        WHERE supplier_id = $1
          AND order_number = $2
          AND (processed IS NULL OR processed <> 'PROCESSED')
        ORDER BY position
        "#,
    )
    .bind(supplier_id)
    .bind(order_number)
    .fetch_all(pool)
    .await
}

/// 更新发票处置与观察 (池上直接执行, 匹配阶段的非匹配落库)
pub async fn update_invoice_disposition(
    pool: &PgPool,
    supplier_id: &str,
    invoice_number: &str,
    disposition: &str,
    observation: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE t_invoice_doc
        SET disposition = $3, observation = $4
        WHERE supplier_id = $1 AND invoice_number = $2
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .bind(disposition)
    .bind(observation)
    .execute(pool)
    .await?;
    Ok(())
}

/// 同上, 事务内版本 (镜像层使用)
pub async fn update_invoice_disposition_tx(
    tx: &mut Transaction<'_, Postgres>,
    supplier_id: &str,
    invoice_number: &str,
    disposition: &str,
    observation: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE t_invoice_doc
        SET disposition = $3, observation = $4
        WHERE supplier_id = $1 AND invoice_number = $2
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .bind(disposition)
    .bind(observation)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// 该 (发票, 字段) 现有槽位数
pub async fn count_slots(
    tx: &mut Transaction<'_, Postgres>,
    supplier_id: &str,
    invoice_number: &str,
    field_name: &str,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT count(*)
        FROM t_comparison_slot
        WHERE supplier_id = $1 AND invoice_number = $2 AND field_name = $3
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .bind(field_name)
    .fetch_one(&mut **tx)
    .await?;
    Ok(count)
}

/// 原地更新一个槽位; None 的列保持原值
pub async fn update_slot(
    tx: &mut Transaction<'_, Postgres>,
    supplier_id: &str,
    invoice_number: &str,
    field_name: &str,
    write: &SlotWrite,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE t_comparison_slot
        SET xml_value = COALESCE($5, xml_value),
            po_value = COALESCE($6, po_value),
            approval = COALESCE($7, approval)
        WHERE supplier_id = $1 AND invoice_number = $2
          AND field_name = $3 AND slot_index = $4
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .bind(field_name)
    .bind(write.slot_index)
    .bind(write.xml_value.as_deref())
    .bind(write.po_value.as_deref())
    .bind(write.approval.as_deref())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// 插入一个新槽位
pub async fn insert_slot(
    tx: &mut Transaction<'_, Postgres>,
    supplier_id: &str,
    invoice_number: &str,
    field_name: &str,
    write: &SlotWrite,
    disposition: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO t_comparison_slot
            (supplier_id, invoice_number, field_name, slot_index,
             xml_value, po_value, approval, disposition)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .bind(field_name)
    .bind(write.slot_index)
    .bind(write.xml_value.as_deref())
    .bind(write.po_value.as_deref())
    .bind(write.approval.as_deref())
    .bind(disposition)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// 处置变化传播到该发票的全部对比行
pub async fn propagate_disposition_to_slots(
    tx: &mut Transaction<'_, Postgres>,
    supplier_id: &str,
    invoice_number: &str,
    disposition: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE t_comparison_slot
        SET disposition = $3
        WHERE supplier_id = $1 AND invoice_number = $2
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .bind(disposition)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// 消费 OC 行: 按 (订单, 供应商, to_settle, 短文本) 元组定位
pub async fn mark_po_processed(
    tx: &mut Transaction<'_, Postgres>,
    order_number: &str,
    supplier_id: &str,
    to_settle: &str,
    short_text: &str,
    marker: &str,
) -> Result<(), sqlx::Error> {
    if to_settle.trim().is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        UPDATE t_po_ledger
        SET processed = $5
        WHERE order_number = $1
          AND supplier_id = $2
          AND to_settle = CAST($3 AS NUMERIC)
          AND COALESCE(short_text, '') = $4
        "#,
    )
    .bind(order_number)
    .bind(supplier_id)
    .bind(to_settle)
    .bind(short_text)
    .bind(marker)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// 查询已处置发票 (导出用)
pub async fn list_dispositioned_invoices(pool: &PgPool) -> Result<Vec<InvoiceDoc>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceDoc>(&format!(
        r#"
        SELECT {INVOICE_COLUMNS}
        FROM t_invoice_doc
        WHERE disposition IS NOT NULL AND disposition <> ''
        ORDER BY supplier_id, invoice_number
        "#
    ))
    .fetch_all(pool)
    .await
}

/// 查询一张发票的全部对比行 (报表导出用)
pub async fn list_comparison_slots(
    pool: &PgPool,
    supplier_id: &str,
    invoice_number: &str,
) -> Result<Vec<ComparisonSlot>, sqlx::Error> {
    sqlx::query_as::<_, ComparisonSlot>(
        r#"
        SELECT supplier_id, invoice_number, field_name, slot_index,
               xml_value, po_value, approval, disposition
        FROM t_comparison_slot
        WHERE supplier_id = $1 AND invoice_number = $2
        ORDER BY field_name, slot_index
        "#,
    )
    .bind(supplier_id)
    .bind(invoice_number)
    .fetch_all(pool)
    .await
}

/// 导出已处置发票到 CSV (下游报表生成的输入)
pub fn export_dispositions_csv(
    rows: &[InvoiceDoc],
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use csv::Writer;
    use std::fs::File;

    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "supplier_id",
        "invoice_number",
        "doc_type",
        "order_number",
        "disposition",
        "observation",
    ])?;
    for row in rows {
        writer.write_record([
            row.supplier_id.clone(),
            row.invoice_number.clone(),
            row.doc_type.clone(),
            row.order_number.clone().unwrap_or_default(),
            row.disposition.clone().unwrap_or_default(),
            row.observation.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// 导出对比行到 CSV (与处置导出同一报表目录)
pub fn export_comparisons_csv(
    rows: &[ComparisonSlot],
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use csv::Writer;
    use std::fs::File;

    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "supplier_id",
        "invoice_number",
        "field_name",
        "slot_index",
        "xml_value",
        "po_value",
        "approval",
        "disposition",
    ])?;
    for row in rows {
        writer.write_record([
            row.supplier_id.clone(),
            row.invoice_number.clone(),
            row.field_name.clone(),
            row.slot_index.to_string(),
            row.xml_value.clone().unwrap_or_default(),
            row.po_value.clone().unwrap_or_default(),
            row.approval.clone().unwrap_or_default(),
            row.disposition.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_export_writes_slot_rows() {
        let rows = vec![ComparisonSlot {
            supplier_id: "800123456".into(),
            invoice_number: "FE-1001".into(),
            field_name: "total_value".into(),
            slot_index: 1,
            xml_value: Some("10000".into()),
            po_value: Some("10050".into()),
            approval: Some("SI".into()),
            disposition: Some("APPROVED".into()),
        }];
        let path = std::env::temp_dir().join("po_recon_comparisons_export_test.csv");
        export_comparisons_csv(&rows, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("total_value"));
        assert!(text.contains("10050"));
        assert!(text.contains("SI"));
        let _ = std::fs::remove_file(&path);
    }
}
