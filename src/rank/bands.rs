use crate::rank::grouping::GroupIndex;

/// Closed 1-indexed interval of output positions an item may legally occupy
/// in the fair ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FairBand {
    pub lo: usize,
    pub hi: usize,
}

impl FairBand {
    pub fn contains(&self, pos: usize) -> bool {
        self.lo <= pos && pos <= self.hi
    }
}

/// Band for the `i`-th best member (1-indexed) of a group of `fp` items out
/// of `n` total: the `i`-th of `fp` proportional blocks of `[1, n]`, so a
/// group holding `fp/n` of the population gets every `n/fp`-th position.
///
/// `lo = floor((i-1)*n/fp) + 1`, `hi = min(ceil(i*n/fp), n)`. When `fp` does
/// not divide `n` evenly, adjacent bands of the same group share a boundary
/// position; the assignment solver resolves that overlap.
pub fn fair_band(i: usize, fp: usize, n: usize) -> FairBand {
    let lo = (i - 1) * n / fp + 1;
    let hi = (i * n).div_ceil(fp).min(n);
    FairBand { lo, hi }
}

/// One band per item, from the within-group positions and group sizes.
pub fn fair_bands(within: &[usize], groups: &GroupIndex) -> Vec<FairBand> {
    let n = within.len();
    within
        .iter()
        .enumerate()
        .map(|(item, &i)| fair_band(i, groups.count(groups.group_of(item)), n))
        .collect()
}
