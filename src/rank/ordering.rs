/// A total order over `n` items, stored in both directions: `order` maps a
/// 1-indexed position to an item, `position` maps an item back to its
/// position. Items are dense indices `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranking {
    order: Vec<usize>,
    position: Vec<usize>,
}

impl Ranking {
    /// Ranks items by descending score (position 1 is the highest score).
    /// Equal scores keep their relative input order, so the tie-break is
    /// stable with respect to the original row order.
    pub fn from_scores(scores: &[f64]) -> Self {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b)));
        Self::from_order(order)
    }

    /// Ranks items by ascending value (position 1 is the lowest value), for
    /// inputs that are rank-like rather than score-like. Ties keep their
    /// relative input order, same as [`Ranking::from_scores`].
    pub fn from_ranks(values: &[f64]) -> Self {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then_with(|| a.cmp(&b)));
        Self::from_order(order)
    }

    /// Builds a ranking from a best-to-worst item sequence.
    pub fn from_order(order: Vec<usize>) -> Self {
        let mut position = vec![0; order.len()];
        for (idx, &item) in order.iter().enumerate() {
            position[item] = idx + 1;
        }
        Self { order, position }
    }

    /// Builds a ranking from an `item -> position` vector (1-indexed).
    pub fn from_positions(position: Vec<usize>) -> Self {
        let mut order = vec![0; position.len()];
        for (item, &pos) in position.iter().enumerate() {
            order[pos - 1] = item;
        }
        Self { order, position }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Items from best (position 1) to worst (position `n`).
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// 1-indexed position of `item`.
    pub fn position_of(&self, item: usize) -> usize {
        self.position[item]
    }

    /// Item occupying the 1-indexed position `pos`.
    pub fn item_at(&self, pos: usize) -> usize {
        self.order[pos - 1]
    }
}
