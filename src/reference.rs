use crate::error::ReconError;
use deunicode::deunicode;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

const CECO_COLUMN: &str = "CECO";
const INDICATOR_COLUMN: &str = "Codigo Ind. Iva aplicable";

/// 特殊税指标参考表 (IVA CECO 工作表): 成本中心 -> 允许的指标集合
///
/// 开放世界策略: 参考表中不存在的成本中心, 指标一律视为有效
/// (按遗留系统观察行为保留)。
#[derive(Debug, Clone, Default)]
pub struct TaxIndicatorTable {
    allowed: HashMap<String, HashSet<String>>,
}

impl TaxIndicatorTable {
    /// 指标对该成本中心是否允许
    pub fn is_allowed(&self, cost_center: &str, indicator: &str) -> bool {
        match self.allowed.get(&ceco_key(cost_center)) {
            Some(set) => set.contains(indicator.trim().to_uppercase().as_str()),
            None => true,
        }
    }

    pub fn contains(&self, cost_center: &str) -> bool {
        self.allowed.contains_key(&ceco_key(cost_center))
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// 从 IVA CECO 表的 CSV 导出读取
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReconError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        // 列名按去重音后比较 (工作簿中的重音不稳定)
        let headers = rdr
            .headers()
            .map_err(|e| ReconError::ReferenceLoadFailed(format!("unreadable headers: {e}")))?
            .clone();
        let mut ceco_idx = None;
        let mut ind_idx = None;
        for (i, h) in headers.iter().enumerate() {
            let plain = deunicode(h).trim().to_string();
            if plain.eq_ignore_ascii_case(CECO_COLUMN) {
                ceco_idx = Some(i);
            } else if plain.eq_ignore_ascii_case(INDICATOR_COLUMN) {
                ind_idx = Some(i);
            }
        }
        let (ceco_idx, ind_idx) = match (ceco_idx, ind_idx) {
            (Some(c), Some(i)) => (c, i),
            _ => {
                return Err(ReconError::ReferenceLoadFailed(format!(
                    "required columns '{CECO_COLUMN}' / '{INDICATOR_COLUMN}' not found"
                )))
            }
        };

        let mut allowed: HashMap<String, HashSet<String>> = HashMap::new();
        for record in rdr.records() {
            let record = record
                .map_err(|e| ReconError::ReferenceLoadFailed(format!("bad record: {e}")))?;
            let ceco = record.get(ceco_idx).unwrap_or_default();
            let inds = record.get(ind_idx).unwrap_or_default();
            if ceco.trim().is_empty() {
                continue;
            }
            let set = allowed.entry(ceco_key(ceco)).or_default();
            for ind in inds.split(['-', ',']) {
                let ind = ind.trim().to_uppercase();
                if !ind.is_empty() {
                    set.insert(ind);
                }
            }
        }
        Ok(Self { allowed })
    }
}

/// 成本中心键规范化: 仅保留数字并去前导零
fn ceco_key(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        if digits.is_empty() {
            raw.trim().to_uppercase()
        } else {
            "0".to_string()
        }
    } else {
        trimmed.to_string()
    }
}

/// 从磁盘加载参考表; 文件缺失是硬失败
pub fn load_tax_indicators(path: &Path) -> Result<TaxIndicatorTable, ReconError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ReconError::ReferenceLoadFailed(format!("cannot open {}: {e}", path.display()))
    })?;
    let table = TaxIndicatorTable::from_reader(file)?;
    tracing::info!("Tax indicator reference loaded: {} cost centers", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
CECO,Codigo Ind. Iva aplicable
12345,H4-H5
67890,\"VP,CO\"
";

    #[test]
    fn loads_and_checks_indicators() {
        let t = TaxIndicatorTable::from_reader(SHEET.as_bytes()).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.is_allowed("12345", "H4"));
        assert!(t.is_allowed("012345", "h5 "));
        assert!(!t.is_allowed("12345", "VP"));
        assert!(t.is_allowed("67890", "CO"));
        assert!(t.contains("012345"));
        assert!(!t.contains("99999"));
    }

    #[test]
    fn unknown_cost_center_is_open_world() {
        // 遗留行为: 参考表没有的 CECO, 任何指标都算有效
        let t = TaxIndicatorTable::from_reader(SHEET.as_bytes()).unwrap();
        assert!(t.is_allowed("99999", "ZZ"));
    }

    #[test]
    fn accented_headers_are_accepted() {
        let sheet = "CECO,Código Ind. Iva aplicable\n111,H6\n";
        let t = TaxIndicatorTable::from_reader(sheet.as_bytes()).unwrap();
        assert!(t.is_allowed("111", "H6"));
        assert!(!t.is_allowed("111", "H4"));
    }

    #[test]
    fn missing_columns_fail_hard() {
        let sheet = "A,B\n1,2\n";
        assert!(matches!(
            TaxIndicatorTable::from_reader(sheet.as_bytes()),
            Err(ReconError::ReferenceLoadFailed(_))
        ));
    }
}
