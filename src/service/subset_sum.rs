/// 兜底全量枚举的组合预算; 超出即按无解处理 (宁可 NO-COMBINATION 不可挂死)
pub const FALLBACK_BUDGET: usize = 100_000;

/// 子集和结果: 选中的原始下标 (升序) + 多解诊断计数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetSum {
    pub indices: Vec<usize>,
    pub ties: usize,
}

/// 固定基数 k 的容差子集和
///
/// 1. k == 1 线性扫描
/// 2. k 个最小/最大的和做界检查
/// 3. 两个极端划分直接试
/// 4. 启发式剪枝: 按 |v - t/k| 升序取前 min(2k, n) 个下标, 枚举其组合
/// 5. 兜底: 预算内按字典序枚举 C(n, k)
///
/// 多个子集同时落在容差内时返回首个命中 (遗留的 first-found 语义),
/// 其余命中只进诊断计数。
pub fn subset_sum(values: &[f64], target: f64, k: usize, tolerance: f64) -> Option<SubsetSum> {
    subset_sum_with_budget(values, target, k, tolerance, FALLBACK_BUDGET)
}

pub fn subset_sum_with_budget(
    values: &[f64],
    target: f64,
    k: usize,
    tolerance: f64,
    budget: usize,
) -> Option<SubsetSum> {
    let n = values.len();
    if k == 0 || k > n {
        return None;
    }

    let hit = |sum: f64| (sum - target).abs() <= tolerance;

    // 1. 单元素: 线性扫描, 顺带统计并列命中
    if k == 1 {
        let mut first = None;
        let mut ties = 0usize;
        for (i, v) in values.iter().enumerate() {
            if hit(*v) {
                if first.is_none() {
                    first = Some(i);
                } else {
                    ties += 1;
                }
            }
        }
        return first.map(|i| SubsetSum { indices: vec![i], ties });
    }

    // 2. 界检查
    let mut by_value: Vec<usize> = (0..n).collect();
    by_value.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let s_min: f64 = by_value[..k].iter().map(|&i| values[i]).sum();
    let s_max: f64 = by_value[n - k..].iter().map(|&i| values[i]).sum();
    if target < s_min - tolerance || target > s_max + tolerance {
        return None;
    }

    // 3. 极端划分
    if hit(s_min) {
        let mut indices: Vec<usize> = by_value[..k].to_vec();
        indices.sort_unstable();
        // s_min == s_max 即全体等值, 任意 C(n, k) 组合都命中
        let ties = if s_min == s_max && n > k {
            binomial(n, k).saturating_sub(1)
        } else {
            usize::from(hit(s_max) && s_min != s_max)
        };
        return Some(SubsetSum { indices, ties });
    }
    if hit(s_max) {
        let mut indices: Vec<usize> = by_value[n - k..].to_vec();
        indices.sort_unstable();
        return Some(SubsetSum { indices, ties: 0 });
    }

    // 4. 启发式剪枝: 离均摊目标最近的下标优先
    let per_slot = target / k as f64;
    let mut ranked: Vec<usize> = (0..n).collect();
    ranked.sort_by(|&a, &b| {
        (values[a] - per_slot)
            .abs()
            .total_cmp(&(values[b] - per_slot).abs())
    });
    let pool: Vec<usize> = ranked[..(2 * k).min(n)].to_vec();

    let mut first: Option<Vec<usize>> = None;
    let mut ties = 0usize;
    for_each_combination(pool.len(), k, usize::MAX, |combo| {
        let sum: f64 = combo.iter().map(|&ci| values[pool[ci]]).sum();
        if hit(sum) {
            if first.is_none() {
                let mut indices: Vec<usize> = combo.iter().map(|&ci| pool[ci]).collect();
                indices.sort_unstable();
                first = Some(indices);
            } else {
                ties += 1;
            }
        }
        true
    });
    if let Some(indices) = first {
        return Some(SubsetSum { indices, ties });
    }

    // 5. 兜底全量枚举 (预算内)
    let mut found: Option<Vec<usize>> = None;
    for_each_combination(n, k, budget, |combo| {
        let sum: f64 = combo.iter().map(|&i| values[i]).sum();
        if hit(sum) {
            found = Some(combo.to_vec());
            return false;
        }
        true
    });
    found.map(|indices| SubsetSum { indices, ties })
}

/// 组合数 C(n, k), 饱和运算 (只做诊断计数)
fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n - k);
    let mut acc: usize = 1;
    for i in 0..k {
        acc = acc.saturating_mul(n - i) / (i + 1);
    }
    acc
}

/// 字典序枚举 C(n, k); 回调返回 false 或达到预算即停止
fn for_each_combination<F: FnMut(&[usize]) -> bool>(n: usize, k: usize, budget: usize, mut f: F) {
    if k == 0 || k > n {
        return;
    }
    let mut combo: Vec<usize> = (0..k).collect();
    let mut tested = 0usize;
    loop {
        tested += 1;
        if !f(&combo) || tested >= budget {
            return;
        }
        // 下一个组合
        let mut i = k;
        loop {
            if i == 0 {
                return;
            }
            i -= 1;
            if combo[i] != i + n - k {
                break;
            }
            if i == 0 {
                return;
            }
        }
        combo[i] += 1;
        for j in i + 1..k {
            combo[j] = combo[j - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_element_scan() {
        let r = subset_sum(&[100.0, 9950.0, 500.0], 10_000.0, 1, 500.0).unwrap();
        assert_eq!(r.indices, vec![1]);
        assert_eq!(r.ties, 0);
    }

    #[test]
    fn bounds_reject_impossible_targets() {
        assert!(subset_sum(&[1.0, 2.0, 3.0], 100.0, 2, 0.5).is_none());
        assert!(subset_sum(&[50.0, 60.0, 70.0], 10.0, 2, 0.5).is_none());
    }

    #[test]
    fn extreme_partition_shortcut() {
        // k 个最小者直接命中
        let r = subset_sum(&[10.0, 20.0, 900.0, 950.0], 30.0, 2, 1.0).unwrap();
        assert_eq!(r.indices, vec![0, 1]);
        // k 个最大者直接命中
        let r = subset_sum(&[10.0, 20.0, 900.0, 950.0], 1850.0, 2, 1.0).unwrap();
        assert_eq!(r.indices, vec![2, 3]);
    }

    #[test]
    fn three_line_reconciliation() {
        // to_settle = [3000, 7000, 5000], 发票总额 10050, k=2, 容差 500
        let r = subset_sum(&[3000.0, 7000.0, 5000.0], 10_050.0, 2, 500.0).unwrap();
        let sum: f64 = r.indices.iter().map(|&i| [3000.0, 7000.0, 5000.0][i]).sum();
        assert!((sum - 10_050.0).abs() <= 500.0);
        assert!(r.indices == vec![0, 1] || r.indices == vec![1, 2]);
    }

    #[test]
    fn soundness_within_tolerance() {
        let values = [120.5, 330.0, 990.0, 45.0, 612.3, 218.7];
        let target = 330.0 + 612.3 + 218.7;
        let r = subset_sum(&values, target, 3, 0.01).unwrap();
        let sum: f64 = r.indices.iter().map(|&i| values[i]).sum();
        assert!((sum - target).abs() <= 0.01);
        assert_eq!(r.indices.len(), 3);
    }

    #[test]
    fn ties_are_counted_not_chosen() {
        // 四个相同值: C(4,2)=6 个组合全部命中, 返回第一个, 其余 5 个进计数
        let r = subset_sum(&[10.0, 10.0, 10.0, 10.0], 20.0, 2, 0.5).unwrap();
        assert_eq!(r.indices.len(), 2);
        assert_eq!(r.ties, 5);
    }

    #[test]
    fn both_extremes_hitting_counts_one_tie() {
        // 最小对 (5+5) 与最大对 (15+15) 都在容差内, 取最小对
        let r = subset_sum(&[5.0, 15.0, 5.0, 15.0], 20.0, 2, 10.0).unwrap();
        assert_eq!(r.indices, vec![0, 2]);
        assert_eq!(r.ties, 1);
    }

    #[test]
    fn fallback_finds_solution_outside_heuristic_pool() {
        // 解 (500+1500) 离均摊目标 1000 最远, 启发式池装不下, 只能兜底命中
        let v = [980.0, 985.0, 990.0, 1030.0, 500.0, 1500.0];
        let r = subset_sum(&v, 2000.0, 2, 0.5).unwrap();
        assert_eq!(r.indices, vec![4, 5]);
    }

    #[test]
    fn fallback_budget_caps_enumeration() {
        // 同上场景, 预算 3 在走到解之前截断
        let v = [980.0, 985.0, 990.0, 1030.0, 500.0, 1500.0];
        let r = subset_sum_with_budget(&v, 2000.0, 2, 0.5, 3);
        assert!(r.is_none(), "budget must cut off the fallback walk");
    }

    #[test]
    fn cardinality_is_exact() {
        let values = [5000.0, 5000.0, 50.0];
        // k=2 时 50 不能单独顶替
        let r = subset_sum(&values, 10_000.0, 2, 100.0).unwrap();
        assert_eq!(r.indices, vec![0, 1]);
        assert!(subset_sum(&values, 50.0, 2, 10.0).is_none());
    }
}
