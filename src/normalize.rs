//! 文本规范化: 遗留数据全是自由文本, 所有跨表比较先过这里。

use crate::error::ReconError;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use deunicode::deunicode;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// 观察列的截断上限 (字符数)
pub const MAX_OBSERVATION_LEN: usize = 3900;

/// 公司法律形式缩写: 带点变体折叠为单一词元 (长形式在前)
const LEGAL_FORM_SUBS: [(&str, &str); 12] = [
    ("S. A. S.", " SAS "),
    ("S.A.S.", " SAS "),
    ("S.A.S", " SAS "),
    ("S A S", " SAS "),
    ("S. EN C. A", " SENCA "),
    ("S. EN C.", " SENC "),
    ("S.EN.C", " SENC "),
    ("S EN C", " SENC "),
    ("S. A.", " SA "),
    ("S.A.", " SA "),
    ("S.A", " SA "),
    ("LIMITADA", " LTDA "),
];

/// 空位判定: 遗留数据的四种空值写法
pub fn is_vacant(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "none" | "null" | "nan"
    )
}

/// Option 文本取值, 缺失得空串
pub fn safe_str(raw: Option<&str>) -> String {
    raw.unwrap_or_default().trim().to_string()
}

pub fn safe_decimal_str(raw: &Option<BigDecimal>) -> String {
    raw.as_ref().map(|d| d.to_string()).unwrap_or_default()
}

pub fn safe_date_str(raw: &Option<NaiveDate>) -> String {
    raw.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// 单边数字解析: 逗号小数点、货币符号与千分位噪声全部剥掉,
/// 解析失败得 0.0 (由校验方归类为不匹配)
pub fn normalize_decimal(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .replace(',', ".")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-'))
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// 管道分隔列拆开: 逐段去空白, 只去掉尾部空段
pub fn split_pipe(raw: &str) -> Vec<String> {
    let mut parts: Vec<String> = raw.split('|').map(|p| p.trim().to_string()).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

pub fn join_pipe(parts: &[String]) -> String {
    parts.join("|")
}

/// 观察文本截断到持久化上限
pub fn truncate_observation(obs: &str) -> String {
    truncate_observation_to(obs, MAX_OBSERVATION_LEN)
}

pub fn truncate_observation_to(obs: &str, limit: usize) -> String {
    obs.chars().take(limit).collect()
}

/// 公司名规范形: 去重音 -> 大写 -> '&' 当 "Y" -> 法律形式折叠 ->
/// 非字母数字转空格 -> 空白折叠
pub fn canonical_company(name: &str) -> String {
    let mut s = deunicode(name).to_uppercase();
    s = s.replace('&', " Y ");
    for (from, to) in LEGAL_FORM_SUBS {
        s = s.replace(from, to);
    }
    let s: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 规范化后的词集合; 连接词 "Y" 不参与比较
pub fn company_tokens(name: &str) -> BTreeSet<String> {
    canonical_company(name)
        .split_whitespace()
        .filter(|t| *t != "Y")
        .map(|t| t.to_string())
        .collect()
}

/// 公司名比较: 词集合相等 (非子集), 双方都得非空
pub fn company_names_match(a: &str, b: &str) -> bool {
    let ta = company_tokens(a);
    let tb = company_tokens(b);
    !ta.is_empty() && ta == tb
}

/// 宿主配置映射解析: 先按严格 JSON, 失败退回宽松字面量
/// (单引号、None/True/False)
pub fn parse_config(raw: &str) -> Result<Map<String, Value>, ReconError> {
    let strict: Result<Value, _> = serde_json::from_str(raw);
    let value = match strict {
        Ok(v) => v,
        Err(_) => {
            let relaxed = raw
                .replace('\'', "\"")
                .replace("None", "null")
                .replace("True", "true")
                .replace("False", "false");
            serde_json::from_str(&relaxed)
                .map_err(|e| ReconError::ConfigInvalid(format!("unparseable config: {e}")))?
        }
    };
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ReconError::ConfigInvalid("config must be a mapping".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn vacant_sentinels() {
        for v in ["", "  ", "none", "None", "NULL", "NaN"] {
            assert!(is_vacant(v), "{v:?} should be vacant");
        }
        assert!(!is_vacant("0"));
        assert!(!is_vacant("N/A"));
    }

    #[test]
    fn decimal_normalization_strips_noise() {
        assert_eq!(normalize_decimal(" 1234,56 "), 1234.56);
        assert_eq!(normalize_decimal("$ 500"), 500.0);
        assert_eq!(normalize_decimal("abc"), 0.0);
        assert_eq!(normalize_decimal("-12.5"), -12.5);
    }

    #[test]
    fn split_pipe_drops_trailing_empties_only() {
        assert_eq!(split_pipe("a| b |c||"), vec!["a", "b", "c"]);
        assert_eq!(split_pipe("a||c"), vec!["a", "", "c"]);
        assert!(split_pipe("").is_empty());
        assert!(split_pipe("||").is_empty());
    }

    #[test]
    fn pipe_round_trip() {
        let parts = vec!["10".to_string(), "20".to_string()];
        assert_eq!(split_pipe(&join_pipe(&parts)), parts);
    }

    #[test]
    fn observation_truncates_at_char_boundary() {
        let obs = "ñ".repeat(4000);
        let t = truncate_observation(&obs);
        assert_eq!(t.chars().count(), MAX_OBSERVATION_LEN);
    }

    #[test]
    fn company_ampersand_equals_y() {
        assert!(company_names_match("Angel & DG Ltda.", "ANGEL Y DG LTDA"));
    }

    #[test]
    fn company_legal_forms_fold() {
        assert!(company_names_match("ACME S.A.S.", "ACME SAS"));
        assert!(company_names_match("Pérez y Cía S. A.", "PEREZ CIA SA"));
    }

    #[test]
    fn company_long_and_plain_forms_fold() {
        assert!(company_names_match("ACME LIMITADA", "ACME LTDA"));
        assert!(company_names_match("ACME S A S", "ACME S.A.S."));
        assert!(company_names_match("ACME S.A", "ACME S. A."));
        assert!(company_names_match("BETA S. EN C. A", "BETA SENCA"));
    }

    #[test]
    fn company_subset_is_not_equality() {
        assert!(!company_names_match("ANGEL DG LTDA", "ANGEL DG LTDA BOGOTA"));
        assert!(!company_names_match("", ""));
    }

    #[test]
    fn safe_accessors_default_to_empty() {
        assert_eq!(safe_str(None), "");
        assert_eq!(safe_str(Some("  x ")), "x");
        assert_eq!(safe_decimal_str(&None), "");
        assert_eq!(
            safe_decimal_str(&Some(BigDecimal::from_str("10.5").unwrap())),
            "10.5"
        );
        assert_eq!(
            safe_date_str(&NaiveDate::from_ymd_opt(2024, 3, 1)),
            "2024-03-01"
        );
    }

    #[test]
    fn config_parses_strict_and_relaxed() {
        let strict = parse_config(r#"{"server": "db01"}"#).unwrap();
        assert_eq!(strict["server"], "db01");

        let relaxed = parse_config("{'server': 'db01', 'db_user': None, 'flag': True}").unwrap();
        assert_eq!(relaxed["server"], "db01");
        assert!(relaxed["db_user"].is_null());
        assert_eq!(relaxed["flag"], true);
    }

    #[test]
    fn config_rejects_non_mapping() {
        assert!(parse_config("tolerance=500").is_err());
        assert!(parse_config("[1, 2]").is_err());
    }
}
