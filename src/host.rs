use crate::error::{ReconError, SYSTEM_ERROR_TAG};
use crate::models::RunSummary;
use std::collections::HashMap;

/// 宿主运行时变量名
pub mod vars {
    pub const CONFIG: &str = "config";
    pub const SUCCESS_FLAG: &str = "success_flag";
    pub const RESULT_SUMMARY: &str = "result_summary";
    pub const ERROR_DETAIL: &str = "error_detail";
    pub const SYSTEM_ERROR_TAG: &str = "system_error_tag";
}

/// 宿主运行时变量总线 — 任何名->值存储都满足该契约;
/// 总线跨 await 持有, 必须可跨线程移动
pub trait HostBus: Send {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: String);
}

/// 内存实现 (测试与 HTTP 适配层使用)
#[derive(Debug, Default, Clone)]
pub struct MemoryBus {
    values: HashMap<String, String>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(raw: &str) -> Self {
        let mut bus = Self::new();
        bus.set(vars::CONFIG, raw.to_string());
        bus
    }
}

impl HostBus for MemoryBus {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: String) {
        self.values.insert(name.to_string(), value);
    }
}

/// 成功结束: 写 success_flag 与 result_summary
pub fn publish_success(bus: &mut dyn HostBus, summary: &RunSummary) {
    bus.set(vars::SUCCESS_FLAG, "true".to_string());
    bus.set(vars::RESULT_SUMMARY, summary.result_line());
}

/// 失败结束: 写错误行、错误详情与系统错误标签
pub fn publish_failure(bus: &mut dyn HostBus, err: &ReconError) {
    bus.set(vars::SUCCESS_FLAG, "false".to_string());
    bus.set(vars::RESULT_SUMMARY, format!("Error: {err}"));
    bus.set(vars::ERROR_DETAIL, format!("{err:?}"));
    bus.set(vars::SYSTEM_ERROR_TAG, SYSTEM_ERROR_TAG.to_string());
}
