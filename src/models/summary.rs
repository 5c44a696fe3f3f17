use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 一次调用的汇总计数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,          // 扫描的 FV 发票数
    pub candidates: usize,     // 生成候选记录数
    pub no_oc: usize,          // 发票无订单号
    pub not_found: usize,      // 无账本行或无明细行
    pub no_combination: usize, // 子集和无解
    pub errors: usize,         // 按发票吞掉的错误数
    pub ties: usize,           // 子集和多解诊断计数
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn set_elapsed(&mut self, d: Duration) {
        self.elapsed_secs = d.as_secs_f64();
    }

    /// 宿主变量 result_summary 的单行结果
    pub fn result_line(&self) -> String {
        format!(
            "Done. Total:{} Candidates:{} NoOC:{} NotFound:{} NoComb:{} Err:{} Time:{:.1}s",
            self.total,
            self.candidates,
            self.no_oc,
            self.not_found,
            self.no_combination,
            self.errors,
            self.elapsed_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_line_shape() {
        let mut s = RunSummary {
            total: 12,
            candidates: 9,
            no_oc: 1,
            not_found: 1,
            no_combination: 1,
            errors: 0,
            ties: 2,
            elapsed_secs: 0.0,
        };
        s.set_elapsed(Duration::from_millis(2500));
        assert_eq!(
            s.result_line(),
            "Done. Total:12 Candidates:9 NoOC:1 NotFound:1 NoComb:1 Err:0 Time:2.5s"
        );
    }
}
