use crate::rank::ordering::Ranking;

/// Kendall-Tau distance between two full rankings of the same item set: the
/// number of unordered item pairs whose relative order the rankings disagree
/// on. Symmetric, zero on identical rankings, at most C(n, 2).
///
/// Counted as inversions of `q`'s positions taken in `p`'s rank order, via
/// merge sort, so it runs in O(n log n) and matches the naive pairwise scan
/// exactly.
pub fn kendall_tau_distance(p: &Ranking, q: &Ranking) -> u64 {
    let mut seq: Vec<usize> = p.order().iter().map(|&item| q.position_of(item)).collect();
    count_inversions(&mut seq)
}

/// C(n, 2), the number of unordered item pairs and the upper bound of
/// [`kendall_tau_distance`].
pub fn max_discordant_pairs(n: usize) -> u64 {
    if n < 2 {
        return 0;
    }
    let n = n as u64;
    n * (n - 1) / 2
}

/// Counts pairs `(i, j)` with `i < j` but `values[i] > values[j]`, sorting
/// the slice as a side effect.
fn count_inversions(values: &mut [usize]) -> u64 {
    if values.len() <= 1 {
        return 0;
    }
    let mut scratch = vec![0usize; values.len()];
    sort_counting(values, &mut scratch)
}

fn sort_counting(values: &mut [usize], scratch: &mut [usize]) -> u64 {
    let n = values.len();
    if n <= 1 {
        return 0;
    }
    let mid = n / 2;
    let (left, right) = values.split_at_mut(mid);
    let (scratch_left, scratch_right) = scratch.split_at_mut(mid);
    let mut inversions = sort_counting(left, scratch_left);
    inversions += sort_counting(right, scratch_right);

    let (mut i, mut j, mut out) = (0, 0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            scratch[out] = left[i];
            i += 1;
        } else {
            // right[j] jumps ahead of every remaining left element.
            scratch[out] = right[j];
            inversions += (left.len() - i) as u64;
            j += 1;
        }
        out += 1;
    }
    while i < left.len() {
        scratch[out] = left[i];
        i += 1;
        out += 1;
    }
    while j < right.len() {
        scratch[out] = right[j];
        j += 1;
        out += 1;
    }
    values.copy_from_slice(&scratch[..n]);
    inversions
}

#[cfg(test)]
mod tests {
    use super::*;

    /// O(n^2) reference: count pairs the two rankings order differently.
    fn naive_distance(p: &Ranking, q: &Ranking) -> u64 {
        let n = p.len();
        let mut distance = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let dp = p.position_of(i) as i64 - p.position_of(j) as i64;
                let dq = q.position_of(i) as i64 - q.position_of(j) as i64;
                if dp * dq < 0 {
                    distance += 1;
                }
            }
        }
        distance
    }

    #[test]
    fn identical_rankings_have_distance_zero() {
        let p = Ranking::from_order(vec![3, 1, 0, 2]);
        assert_eq!(kendall_tau_distance(&p, &p), 0);
    }

    #[test]
    fn reversed_ranking_hits_the_upper_bound() {
        let p = Ranking::from_order((0..7).collect());
        let q = Ranking::from_order((0..7).rev().collect());
        assert_eq!(kendall_tau_distance(&p, &q), max_discordant_pairs(7));
    }

    #[test]
    fn distance_is_symmetric() {
        let p = Ranking::from_order(vec![2, 0, 4, 1, 3]);
        let q = Ranking::from_order(vec![4, 2, 1, 0, 3]);
        assert_eq!(kendall_tau_distance(&p, &q), kendall_tau_distance(&q, &p));
    }

    #[test]
    fn adjacent_swap_costs_one() {
        let p = Ranking::from_order(vec![0, 1, 2, 3]);
        let q = Ranking::from_order(vec![0, 2, 1, 3]);
        assert_eq!(kendall_tau_distance(&p, &q), 1);
    }

    #[test]
    fn matches_naive_scan_on_assorted_permutations() {
        let fixed: Vec<Vec<usize>> = vec![
            vec![0, 1, 2, 3, 4, 5, 6, 7],
            vec![7, 6, 5, 4, 3, 2, 1, 0],
            vec![3, 0, 7, 1, 5, 2, 6, 4],
            vec![1, 3, 5, 7, 0, 2, 4, 6],
        ];
        for a in &fixed {
            for b in &fixed {
                let p = Ranking::from_order(a.clone());
                let q = Ranking::from_order(b.clone());
                assert_eq!(kendall_tau_distance(&p, &q), naive_distance(&p, &q));
            }
        }

        // Larger case: a multiplicative shuffle of 0..51 (17 is coprime to 51).
        let n = 51;
        let shuffled: Vec<usize> = (0..n).map(|i| (i * 17) % n).collect();
        let p = Ranking::from_order((0..n).collect());
        let q = Ranking::from_order(shuffled);
        let d = kendall_tau_distance(&p, &q);
        assert_eq!(d, naive_distance(&p, &q));
        assert!(d > 0);
        assert!(d <= max_discordant_pairs(n));
    }

    #[test]
    fn degenerate_sizes() {
        assert_eq!(max_discordant_pairs(0), 0);
        assert_eq!(max_discordant_pairs(1), 0);
        let p = Ranking::from_order(vec![0]);
        assert_eq!(kendall_tau_distance(&p, &p), 0);
    }
}
