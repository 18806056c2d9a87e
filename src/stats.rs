//! Distributional statistics over trial outcomes.

use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::types::ItemId;

/// Shannon entropy, in bits, of the distribution given by `counts`.
///
/// Zero counts contribute nothing; an empty or all-zero table has entropy 0.
pub fn shannon_entropy_bits(counts: impl IntoIterator<Item = u64> + Clone) -> f64 {
    let total: u64 = counts.clone().into_iter().sum();
    if total == 0 {
        return 0.0;
    }
    let mut entropy = 0.0;
    for c in counts.into_iter().filter(|&c| c > 0) {
        let p = c as f64 / total as f64;
        entropy -= p * p.log2();
    }
    entropy
}

/// Gini coefficient of `counts`, from the sorted cumulative sum:
/// `2 * sum(i * x_i) / (n * sum(x)) - (n + 1) / n` with 1-based `i`.
pub fn gini(counts: &[u64]) -> f64 {
    let n = counts.len();
    let total: u64 = counts.iter().sum();
    if n == 0 || total == 0 {
        return 0.0;
    }
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (i + 1) as f64 * x as f64)
        .sum();
    let n = n as f64;
    (2.0 * weighted) / (n * total as f64) - (n + 1.0) / n
}

/// Population standard deviation of per-worker counts, 0 for fewer than two workers
pub fn coverage_skew(per_worker: &[usize]) -> f64 {
    if per_worker.len() < 2 {
        return 0.0;
    }
    per_worker
        .iter()
        .map(|&c| c as f64)
        .population_std_dev()
}

/// Arithmetic mean, 0 for no samples
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.mean()
    }
}

/// How often each item won, over a pool of `pool` items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WinnerTable {
    pool: usize,
    counts: BTreeMap<ItemId, u64>,
}

impl WinnerTable {
    pub fn new(pool: usize) -> Self {
        Self {
            pool,
            counts: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, winner: ItemId) {
        *self.counts.entry(winner).or_insert(0) += 1;
    }

    /// Number of distinct winners
    pub fn support(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, item: ItemId) -> u64 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    pub fn entropy_bits(&self) -> f64 {
        shannon_entropy_bits(self.counts.values().copied())
    }

    /// Gini over the whole pool, items that never won count as zero.
    ///
    /// Equal winners are only "equal" when they cover the pool: two items
    /// with the same count in a pool of 400 score 0.995, not 0.
    pub fn gini(&self) -> f64 {
        let mut counts: Vec<u64> = self.counts.values().copied().collect();
        let padding = self.pool.saturating_sub(counts.len());
        counts.extend(std::iter::repeat(0).take(padding));
        gini(&counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn entropy_of_uniform_distribution() {
        assert_abs_diff_eq!(shannon_entropy_bits(vec![5, 5, 5, 5]), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(shannon_entropy_bits(vec![1, 1]), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn entropy_degenerate_cases() {
        assert_eq!(shannon_entropy_bits(Vec::<u64>::new()), 0.0);
        assert_eq!(shannon_entropy_bits(vec![0, 0]), 0.0);
        assert_eq!(shannon_entropy_bits(vec![42]), 0.0);
        assert_eq!(shannon_entropy_bits(vec![0, 42, 0]), 0.0);
    }

    #[test]
    fn gini_extremes() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0, 0, 0]), 0.0);
        assert_abs_diff_eq!(gini(&[3, 3, 3, 3]), 0.0, epsilon = 1e-12);
        // one holder out of four: 1 - 1/4
        assert_abs_diff_eq!(gini(&[0, 0, 8, 0]), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn gini_is_order_independent() {
        assert_abs_diff_eq!(gini(&[1, 2, 3, 10]), gini(&[10, 3, 1, 2]), epsilon = 1e-12);
        // sorted [1, 2, 3, 10]: 2 * 54 / (4 * 16) - 5 / 4
        assert_abs_diff_eq!(gini(&[1, 2, 3, 10]), 0.4375, epsilon = 1e-12);
    }

    #[test]
    fn winner_gini_counts_the_whole_pool() {
        let mut table = WinnerTable::new(400);
        for _ in 0..10 {
            table.record(3);
            table.record(17);
        }
        assert_eq!(table.support(), 2);
        assert_abs_diff_eq!(table.entropy_bits(), 1.0, epsilon = 1e-12);
        // 398 zeros, two tens: 1 - 2/400
        assert_abs_diff_eq!(table.gini(), 0.995, epsilon = 1e-12);

        let mut full = WinnerTable::new(2);
        full.record(0);
        full.record(1);
        assert_abs_diff_eq!(full.gini(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn skew_is_population_std_dev() {
        assert_eq!(coverage_skew(&[]), 0.0);
        assert_eq!(coverage_skew(&[17]), 0.0);
        assert_abs_diff_eq!(coverage_skew(&[4, 4, 4]), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(coverage_skew(&[2, 4, 4, 4, 5, 5, 7, 9]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_abs_diff_eq!(mean(&[1.0, 2.0, 6.0]), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn winner_table() {
        let mut table = WinnerTable::new(10);
        assert_eq!(table.support(), 0);
        assert_eq!(table.entropy_bits(), 0.0);
        assert_eq!(table.gini(), 0.0);

        for _ in 0..100 {
            table.record(3);
        }
        assert_eq!(table.support(), 1);
        assert_eq!(table.count(3), 100);
        assert_eq!(table.count(4), 0);
        assert_eq!(table.entropy_bits(), 0.0);
        assert_abs_diff_eq!(table.gini(), 0.9, epsilon = 1e-12);

        table.record(7);
        assert_eq!(table.support(), 2);
        assert!(table.entropy_bits() > 0.0);
    }
}
