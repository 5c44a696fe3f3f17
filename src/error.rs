use thiserror::Error;

/// 宿主侧系统错误标签 (失败结束时写入 system_error_tag)
pub const SYSTEM_ERROR_TAG: &str = "ErrorHU4_4.1";

/// 对账流水线错误分类
///
/// 连接、参考表与持久化错误终止整次调用; 单据级错误在匹配阶段
/// 按发票计数后吞掉, 不中断批次。阶段引擎是纯函数、自身不产错,
/// 阶段结果落库时的失败归入 CandidateError / PersistError,
/// 不单列阶段错误。
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("database connection failed after {attempts} attempts")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("tax indicator reference load failed: {0}")]
    ReferenceLoadFailed(String),

    #[error("candidate error for {supplier_id}/{invoice_number}: {detail}")]
    CandidateError {
        supplier_id: String,
        invoice_number: String,
        detail: String,
    },

    #[error("persistence failed: {0}")]
    PersistError(#[from] sqlx::Error),
}

impl ReconError {
    /// 是否终止整次调用 (单据级错误只计数)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReconError::CandidateError { .. })
    }
}
