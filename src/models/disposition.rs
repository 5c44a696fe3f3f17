use std::fmt;
use std::str::FromStr;

/// 发票最终处置状态 (处置列的合法取值)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Approved,
    ApprovedCash,
    ApprovedNoAccounting,
    WithNovelty,
    WithNoveltyCash,
    WithNoveltyExcluded,
    WithNoveltyCashExcluded,
    /// 人工流程或后续调用产生的遗留状态 (本引擎只读取, 不产出)
    ApprovedCashOrManualEvent,
    Waiting,
    WaitingCash,
    Rejected,
    RejectedReturned,
    Reclassify,
    NotSuccessful,
    NotFound,
    NoCombination,
    /// 预检排除, 标签进状态串
    Excluded(String),
}

impl Disposition {
    /// 新颖性族 (含 EXCLUDED-ACCOUNTING 标注变体)
    pub fn is_novelty(&self) -> bool {
        matches!(
            self,
            Disposition::WithNovelty
                | Disposition::WithNoveltyCash
                | Disposition::WithNoveltyExcluded
                | Disposition::WithNoveltyCashExcluded
        )
    }

    /// APPROVED 族 (触发 OC 行消费)
    pub fn is_approved(&self) -> bool {
        matches!(
            self,
            Disposition::Approved
                | Disposition::ApprovedCash
                | Disposition::ApprovedNoAccounting
                | Disposition::ApprovedCashOrManualEvent
        )
    }

    /// 给新颖性处置加 EXCLUDED-ACCOUNTING 标注; 幂等, 非新颖性原样返回
    pub fn with_excluded_accounting(self) -> Self {
        match self {
            Disposition::WithNovelty => Disposition::WithNoveltyExcluded,
            Disposition::WithNoveltyCash => Disposition::WithNoveltyCashExcluded,
            other => other,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Disposition::Approved => "APPROVED",
            Disposition::ApprovedCash => "APPROVED-CASH",
            Disposition::ApprovedNoAccounting => "APPROVED-NO-ACCOUNTING",
            Disposition::WithNovelty => "WITH-NOVELTY",
            Disposition::WithNoveltyCash => "WITH-NOVELTY-CASH",
            Disposition::WithNoveltyExcluded => "WITH-NOVELTY/EXCLUDED-ACCOUNTING",
            Disposition::WithNoveltyCashExcluded => "WITH-NOVELTY-CASH/EXCLUDED-ACCOUNTING",
            Disposition::ApprovedCashOrManualEvent => "APPROVED-CASH-OR-MANUAL-EVENT",
            Disposition::Waiting => "WAITING",
            Disposition::WaitingCash => "WAITING-CASH",
            Disposition::Rejected => "REJECTED",
            Disposition::RejectedReturned => "REJECTED-RETURNED",
            Disposition::Reclassify => "RECLASSIFY",
            Disposition::NotSuccessful => "NOT-SUCCESSFUL",
            Disposition::NotFound => "NOT-FOUND",
            Disposition::NoCombination => "NO-COMBINATION",
            Disposition::Excluded(tag) => return write!(f, "EXCLUDED-{tag}"),
        };
        f.write_str(s)
    }
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "APPROVED" => Ok(Disposition::Approved),
            "APPROVED-CASH" => Ok(Disposition::ApprovedCash),
            "APPROVED-NO-ACCOUNTING" => Ok(Disposition::ApprovedNoAccounting),
            "WITH-NOVELTY" => Ok(Disposition::WithNovelty),
            "WITH-NOVELTY-CASH" => Ok(Disposition::WithNoveltyCash),
            "WITH-NOVELTY/EXCLUDED-ACCOUNTING" => Ok(Disposition::WithNoveltyExcluded),
            "WITH-NOVELTY-CASH/EXCLUDED-ACCOUNTING" => Ok(Disposition::WithNoveltyCashExcluded),
            "APPROVED-CASH-OR-MANUAL-EVENT" => Ok(Disposition::ApprovedCashOrManualEvent),
            "WAITING" => Ok(Disposition::Waiting),
            "WAITING-CASH" => Ok(Disposition::WaitingCash),
            "REJECTED" => Ok(Disposition::Rejected),
            "REJECTED-RETURNED" => Ok(Disposition::RejectedReturned),
            "RECLASSIFY" => Ok(Disposition::Reclassify),
            "NOT-SUCCESSFUL" => Ok(Disposition::NotSuccessful),
            "NOT-FOUND" => Ok(Disposition::NotFound),
            "NO-COMBINATION" => Ok(Disposition::NoCombination),
            other => match other.strip_prefix("EXCLUDED-") {
                Some(tag) if !tag.is_empty() => Ok(Disposition::Excluded(tag.to_string())),
                _ => Err(format!("unknown disposition: {other}")),
            },
        }
    }
}

/// 槽位审批值 (对比表 approval 列)
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Approval {
    Si,
    No,
}

impl Approval {
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            Approval::Si
        } else {
            Approval::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Approval::Si => "SI",
            Approval::No => "NO",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Approval::Si)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips() {
        let all = [
            Disposition::Approved,
            Disposition::ApprovedCash,
            Disposition::ApprovedNoAccounting,
            Disposition::WithNovelty,
            Disposition::WithNoveltyCash,
            Disposition::WithNoveltyExcluded,
            Disposition::WithNoveltyCashExcluded,
            Disposition::ApprovedCashOrManualEvent,
            Disposition::Waiting,
            Disposition::WaitingCash,
            Disposition::Rejected,
            Disposition::RejectedReturned,
            Disposition::Reclassify,
            Disposition::NotSuccessful,
            Disposition::NotFound,
            Disposition::NoCombination,
            Disposition::Excluded("NC".into()),
        ];
        for d in all {
            let parsed: Disposition = d.to_string().parse().unwrap();
            assert_eq!(parsed, d);
        }
    }

    #[test]
    fn excluded_annotation_is_idempotent() {
        let d = Disposition::WithNovelty.with_excluded_accounting();
        assert_eq!(d, Disposition::WithNoveltyExcluded);
        assert_eq!(d.clone().with_excluded_accounting(), d);
        assert_eq!(
            Disposition::Approved.with_excluded_accounting(),
            Disposition::Approved
        );
    }

    #[test]
    fn family_predicates() {
        assert!(Disposition::ApprovedCash.is_approved());
        assert!(!Disposition::ApprovedCash.is_novelty());
        assert!(Disposition::WithNoveltyCashExcluded.is_novelty());
        assert!(Disposition::ApprovedCashOrManualEvent.is_approved());
        assert!(!Disposition::Waiting.is_approved());
        assert!(!Disposition::Rejected.is_approved());
        assert!(!Disposition::WaitingCash.is_novelty());
    }

    #[test]
    fn approval_maps_to_legacy_strings() {
        assert_eq!(Approval::from_bool(true).as_str(), "SI");
        assert_eq!(Approval::from_bool(false).as_str(), "NO");
        assert!(Approval::Si.is_ok());
    }
}
