use std::collections::HashMap;

use crate::rank::ordering::Ranking;

/// Interned protected-attribute labels for one item set: per-item group id
/// plus per-group size. Built once per item set and read-only afterwards.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    labels: Vec<String>,
    group_of: Vec<usize>,
    counts: Vec<usize>,
}

impl GroupIndex {
    /// Interns the labels in first-seen order and counts each group.
    pub fn from_labels(labels_per_item: &[String]) -> Self {
        let mut labels: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut group_of = Vec::with_capacity(labels_per_item.len());
        for label in labels_per_item {
            let g = match index.get(label.as_str()) {
                Some(&g) => g,
                None => {
                    let g = labels.len();
                    labels.push(label.clone());
                    index.insert(label.as_str(), g);
                    g
                }
            };
            group_of.push(g);
        }
        let mut counts = vec![0; labels.len()];
        for &g in &group_of {
            counts[g] += 1;
        }
        Self {
            labels,
            group_of,
            counts,
        }
    }

    pub fn n_items(&self) -> usize {
        self.group_of.len()
    }

    pub fn n_groups(&self) -> usize {
        self.labels.len()
    }

    /// Group id of `item`.
    pub fn group_of(&self, item: usize) -> usize {
        self.group_of[item]
    }

    /// Number of items carrying group `g`.
    pub fn count(&self, g: usize) -> usize {
        self.counts[g]
    }

    pub fn label(&self, g: usize) -> &str {
        &self.labels[g]
    }
}

/// Within-group position of every item in `ranking`: traverse best to worst
/// with one private counter per group; the i-th visited member of a group
/// gets value `i`. Single pass, O(n), no shared state between rankings.
pub fn within_group_positions(ranking: &Ranking, groups: &GroupIndex) -> Vec<usize> {
    let mut counters = vec![0usize; groups.n_groups()];
    let mut within = vec![0usize; ranking.len()];
    for &item in ranking.order() {
        let g = groups.group_of(item);
        counters[g] += 1;
        within[item] = counters[g];
    }
    within
}
