use crate::config::AppConfig;
use crate::db::queries;
use crate::error::ReconError;
use crate::host::{publish_failure, publish_success, HostBus};
use crate::models::RunSummary;
use crate::reference::load_tax_indicators;
use crate::service::matcher::run_matcher;
use crate::service::phases::{PhaseContext, PhaseEngine};
use crate::service::{mirror, postprocess};
use sqlx::PgPool;
use std::path::Path;
use std::time::Instant;

/// 对账运行器 — 一次调用跑完整条流水线:
/// 匹配 -> 阶段引擎 -> 后处理 -> 镜像。
/// 调用内单线程顺序处理; 每张发票的写入在自己的事务里。
pub struct ReconRunner {
    pool: PgPool,
    config: AppConfig,
}

impl ReconRunner {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        Self { pool, config }
    }

    pub async fn run(&self) -> Result<RunSummary, ReconError> {
        let started = Instant::now();
        let reference =
            load_tax_indicators(Path::new(&self.config.engine.tax_indicator_file))?;

        let mut summary = RunSummary::default();
        let candidates = run_matcher(&self.pool, &self.config.engine, &mut summary).await?;

        let engine = PhaseEngine::new(PhaseContext {
            tolerance: self.config.engine.tolerance,
            trm_tolerance: self.config.engine.trm_tolerance,
            reference,
        });

        for (idx, cand) in candidates.iter().enumerate() {
            let outcome = engine.run(cand);
            let decision = postprocess::apply(cand, &outcome.disposition);
            mirror::persist_with_retry(&self.pool, cand, &outcome, &decision).await?;

            let current = idx + 1;
            if current % 100 == 0 || current == 1 {
                tracing::info!("Disposition progress: {}/{}", current, candidates.len());
            }
        }

        if let Some(report_root) = &self.config.report.report_root {
            self.export_report(report_root).await;
        }

        summary.set_elapsed(started.elapsed());
        tracing::info!("{}", summary.result_line());
        Ok(summary)
    }

    /// 跑完整流水线并把结果写回宿主变量总线
    pub async fn run_with_bus(&self, bus: &mut dyn HostBus) -> Result<RunSummary, ReconError> {
        match self.run().await {
            Ok(summary) => {
                publish_success(bus, &summary);
                Ok(summary)
            }
            Err(e) => {
                publish_failure(bus, &e);
                Err(e)
            }
        }
    }

    /// 导出已处置发票与对比行给下游报表生成器;
    /// 导出失败只记日志, 不影响处置结果
    async fn export_report(&self, report_root: &str) {
        let rows = match queries::list_dispositioned_invoices(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Disposition export query failed: {}", e);
                return;
            }
        };
        let path = Path::new(report_root).join("dispositions.csv");
        if let Err(e) = queries::export_dispositions_csv(&rows, &path) {
            tracing::error!("Disposition export failed: {}", e);
            return;
        }
        tracing::info!("Exported {} dispositions to {}", rows.len(), path.display());

        let mut slots = Vec::new();
        for inv in &rows {
            match queries::list_comparison_slots(&self.pool, &inv.supplier_id, &inv.invoice_number)
                .await
            {
                Ok(mut s) => slots.append(&mut s),
                Err(e) => {
                    tracing::error!(
                        "Comparison export query failed for {}/{}: {}",
                        inv.supplier_id,
                        inv.invoice_number,
                        e
                    );
                    return;
                }
            }
        }
        let slots_path = Path::new(report_root).join("comparisons.csv");
        if let Err(e) = queries::export_comparisons_csv(&slots, &slots_path) {
            tracing::error!("Comparison export failed: {}", e);
        } else {
            tracing::info!(
                "Exported {} comparison rows to {}",
                slots.len(),
                slots_path.display()
            );
        }
    }
}
