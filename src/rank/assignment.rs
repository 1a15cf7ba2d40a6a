use pathfinding::prelude::{kuhn_munkres_min, Matrix};

use crate::rank::bands::FairBand;
use crate::rank::ordering::Ranking;

/// A fair re-ranking produced by the matching solver.
#[derive(Debug, Clone)]
pub struct FairAssignment {
    /// The new item-to-position bijection.
    pub ranking: Ranking,
    /// Total displacement cost of the matching.
    pub total_cost: i64,
    /// False when the solver had to take an out-of-band edge, meaning the
    /// bands admit no in-band perfect matching. The result is still a
    /// bijection, just not a fair one.
    pub feasible: bool,
}

/// Sentinel weight for out-of-band edges, sized relative to `n`: any
/// in-band matching costs at most `n * (n - 1)` in total, so a single
/// sentinel edge strictly dominates every feasible alternative.
pub fn prohibitive_cost(n: usize) -> i64 {
    let n = n as i64;
    n * n + 1
}

/// Minimum-displacement perfect matching of items onto positions `1..=n`,
/// restricted to each item's fair band.
///
/// Builds the complete items-by-positions cost matrix (in-band edges weigh
/// the absolute displacement from the item's original position, out-of-band
/// edges weigh [`prohibitive_cost`]) and solves it with Kuhn-Munkres. The
/// n-squared matrix construction dominates the running time for large `n`.
///
/// Infeasibility is detected after the fact: a total cost at or above the
/// sentinel means at least one item was pushed outside its band.
pub fn solve_fair_assignment(original: &Ranking, bands: &[FairBand]) -> FairAssignment {
    let n = original.len();
    if n == 0 {
        return FairAssignment {
            ranking: Ranking::from_positions(Vec::new()),
            total_cost: 0,
            feasible: true,
        };
    }
    let prohibitive = prohibitive_cost(n);
    let weights = Matrix::from_fn(n, n, |(item, col)| {
        let pos = col + 1;
        if bands[item].contains(pos) {
            (original.position_of(item) as i64 - pos as i64).abs()
        } else {
            prohibitive
        }
    });
    let (total_cost, assigned) = kuhn_munkres_min(&weights);
    let positions: Vec<usize> = assigned.into_iter().map(|col| col + 1).collect();
    FairAssignment {
        ranking: Ranking::from_positions(positions),
        total_cost,
        feasible: total_cost < prohibitive,
    }
}
