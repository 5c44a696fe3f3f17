pub mod fixed_asset;
pub mod generals;
pub mod issuer_name;
pub mod order_branch;
pub mod pep_element;
pub mod price_qty;
pub mod total_value;
pub mod trm;

use crate::models::{CandidateRecord, Disposition, FieldComparison};
use crate::normalize::truncate_observation;
use crate::reference::TaxIndicatorTable;
use indexmap::IndexMap;

pub use fixed_asset::FixedAssetPhase;
pub use generals::GeneralsPhase;
pub use issuer_name::IssuerNamePhase;
pub use order_branch::OrderBranchPhase;
pub use pep_element::PepElementPhase;
pub use price_qty::PriceQtyPhase;
pub use total_value::TotalValuePhase;
pub use trm::TrmPhase;

/// 各分支共享的业务常量
pub mod codes {
    /// 阶段 3 发行方名称校验适用的订单类别
    pub const ISSUER_CLASSES: [&str; 5] = ["ZPRE", "ZPPA", "ZPCN", "45", "42"];
    /// 阶段 4 价格/数量校验适用的类别 (ZPRE 族)
    pub const PRICE_QTY_CLASSES: [&str; 3] = ["ZPRE", "ZPSA", "ZPSS"];
    /// 阶段 5-8 分支校验适用的类别
    pub const BRANCH_CLASSES: [&str; 3] = ["ZPPA", "ZPCN", "42"];

    /// 项目类指标 (内部订单 15*/PEP 分支共用)
    pub const PROJECT_INDICATORS: [&str; 8] = ["H4", "H5", "H6", "H7", "VP", "CO", "IC", "CR"];
    /// 递延固定资产 (2000*) 允许指标
    pub const DEFERRED_FA_INDICATORS: [&str; 5] = ["C1", "FA", "VP", "CO", "CR"];
    /// 债券固定资产 (8000*) 允许指标
    pub const BOND_FA_INDICATORS: [&str; 4] = ["C1", "VP", "CO", "CR"];

    pub const PROJECT_ACCOUNT: &str = "5199150001";
    pub const GENERAL_ACCOUNT: &str = "5299150099";
    pub const DEFERRED_ACCOUNT: &str = "2695950020";

    /// ZOMAC-ZESE 特殊税类
    pub const TAX_CLASS_ZOMAC: &str = "31";
}

/// 对比表字段名 (与遗留对比表的字段值一致)
pub mod field {
    pub const TOTAL_VALUE: &str = "total_value";
    pub const TRM: &str = "trm";
    pub const ISSUER_NAME: &str = "issuer_name";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const QUANTITY: &str = "quantity";
    pub const TAX_INDICATOR: &str = "tax_indicator";
    pub const COST_CENTER: &str = "cost_center";
    pub const ACCOUNT: &str = "account";
    pub const ACCOUNT_CLASS: &str = "account_class";
    pub const INTERNAL_ORDER: &str = "internal_order";
    pub const PEP_ELEMENT: &str = "pep_element";
    pub const FIXED_ASSET: &str = "fixed_asset";
}

/// 阶段运行参数
#[derive(Debug, Clone, Default)]
pub struct PhaseContext {
    pub tolerance: f64,
    pub trm_tolerance: f64,
    pub reference: TaxIndicatorTable,
}

/// 一张发票跑完全部阶段后的累积输出
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub disposition: Disposition,
    pub observation: String,
    pub comparisons: IndexMap<String, FieldComparison>,
}

impl Default for PhaseOutcome {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseOutcome {
    pub fn new() -> Self {
        Self {
            disposition: Disposition::Approved,
            observation: String::new(),
            comparisons: IndexMap::new(),
        }
    }

    /// 观察前插组合: 新内容在前, ", " 连接
    pub fn note(&mut self, obs: &str) {
        if self.observation.is_empty() {
            self.observation = obs.to_string();
        } else {
            self.observation = format!("{}, {}", obs, self.observation);
        }
    }

    /// 标记新颖性; 处置只恶化不回退
    pub fn worsen(&mut self, cash: bool) {
        if self.disposition == Disposition::Approved {
            self.disposition = if cash {
                Disposition::WithNoveltyCash
            } else {
                Disposition::WithNovelty
            };
        }
    }

    /// 阶段失败: 记观察并恶化处置
    pub fn fail(&mut self, cand: &CandidateRecord, obs: &str) {
        self.note(obs);
        self.worsen(cand.is_cash());
    }

    /// 记录一个字段的槽位对比
    pub fn record(&mut self, fc: FieldComparison) {
        self.comparisons.insert(fc.field.clone(), fc);
    }

    /// 持久化前的观察文本 (有界)
    pub fn bounded_observation(&self) -> String {
        truncate_observation(&self.observation)
    }
}

/// 一个校验阶段: 适用谓词 + 字段检查 + 观察模板
pub trait Phase {
    fn name(&self) -> &'static str;
    fn applies(&self, cand: &CandidateRecord) -> bool;
    fn run(&self, cand: &CandidateRecord, ctx: &PhaseContext, out: &mut PhaseOutcome);
}

/// 阶段引擎: 按固定顺序执行各阶段, 适用的才跑,
/// 进入新颖性后其余阶段照常贡献观察与审批, 处置不再回升。
pub struct PhaseEngine {
    ctx: PhaseContext,
}

impl PhaseEngine {
    pub fn new(ctx: PhaseContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &PhaseContext {
        &self.ctx
    }

    pub fn run(&self, cand: &CandidateRecord) -> PhaseOutcome {
        let phases: [&dyn Phase; 8] = [
            &TotalValuePhase,
            &TrmPhase,
            &IssuerNamePhase,
            &PriceQtyPhase,
            &OrderBranchPhase,
            &PepElementPhase,
            &FixedAssetPhase,
            &GeneralsPhase,
        ];

        let mut out = PhaseOutcome::new();
        for phase in phases {
            if !phase.applies(cand) {
                continue;
            }
            phase.run(cand, &self.ctx, &mut out);
            tracing::debug!(
                "Phase {} on {}/{} -> {}",
                phase.name(),
                cand.supplier_id_dp,
                cand.invoice_number_dp,
                out.disposition
            );
        }
        out
    }
}

/// 金额显示: 整值不带小数位
pub(crate) fn fmt_amount(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Approval;

    fn cand_cash(cash: bool) -> CandidateRecord {
        CandidateRecord {
            payment_term_dp: if cash { "01".into() } else { "2".into() },
            ..Default::default()
        }
    }

    #[test]
    fn note_prepends_with_comma_join() {
        let mut out = PhaseOutcome::new();
        out.note("first");
        out.note("second");
        assert_eq!(out.observation, "second, first");
    }

    #[test]
    fn worsen_is_monotonic() {
        let mut out = PhaseOutcome::new();
        out.fail(&cand_cash(false), "x");
        assert_eq!(out.disposition, Disposition::WithNovelty);
        // 再失败也不切换现金变体
        out.fail(&cand_cash(true), "y");
        assert_eq!(out.disposition, Disposition::WithNovelty);
    }

    #[test]
    fn cash_payment_term_flips_novelty_variant() {
        let mut out = PhaseOutcome::new();
        out.fail(&cand_cash(true), "x");
        assert_eq!(out.disposition, Disposition::WithNoveltyCash);
    }

    #[test]
    fn record_keeps_field_order() {
        let mut out = PhaseOutcome::new();
        let mut a = FieldComparison::new("total_value");
        a.approvals.push(Approval::Si);
        out.record(a);
        out.record(FieldComparison::new("trm"));
        let fields: Vec<&String> = out.comparisons.keys().collect();
        assert_eq!(fields, ["total_value", "trm"]);
    }
}
