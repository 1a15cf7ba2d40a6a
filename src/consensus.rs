//! Multi-ranking mode: one fair re-ranking per source ranking, then
//! selection of the candidate minimizing total Kendall-Tau distance to the
//! others (an approximate Kemeny consensus).

use std::collections::HashMap;

use comfy_table::{Cell, Table};
use getset::Getters;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use crate::rank::assignment::{solve_fair_assignment, FairAssignment};
use crate::rank::bands::fair_bands;
use crate::rank::distance::kendall_tau_distance;
use crate::rank::grouping::{within_group_positions, GroupIndex};
use crate::rank::ordering::Ranking;
use crate::FairRankError;

/// Configures the multi-ranking fairness pipeline.
///
/// Every source ranking is re-ranked under its fair bands independently (in
/// parallel), and the candidate whose total pairwise distance to the other
/// candidates is smallest wins. The consensus search is deliberately
/// restricted to the candidates actually produced; true Kemeny optimization
/// over the full permutation space is NP-hard and out of scope.
#[derive(Debug, Clone)]
pub struct ConsensusBuilder {
    rankings: DataFrame,
    attributes: DataFrame,
    id: String,
    group: String,
    ascending: bool,
}

impl ConsensusBuilder {
    /// # Arguments
    ///
    /// * `rankings` - wide frame: one column per item (headers are item ids),
    ///   one row per source ranking, cells are scores (higher is better).
    /// * `attributes` - frame mapping item ids to protected-attribute labels.
    /// * `id` - column of `attributes` holding the item identifier.
    /// * `group` - column of `attributes` holding the protected attribute.
    pub fn new(rankings: DataFrame, attributes: DataFrame, id: &str, group: &str) -> Self {
        Self {
            rankings,
            attributes,
            id: id.to_string(),
            group: group.to_string(),
            ascending: false,
        }
    }

    /// Treats the cells as rank values instead of scores: lower is better,
    /// for wide frames that record positions rather than raw scores.
    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = ascending;
        self
    }

    /// Runs the full pipeline: per-ranking fair assignment, then consensus
    /// selection over the candidates that survived validation.
    ///
    /// A malformed source ranking aborts only its own pipeline; the skipped
    /// count is reported on stderr and in the results. Items without a group
    /// label abort the whole run, since every ranking references them.
    pub fn run(&self) -> Result<ConsensusResults, FairRankError> {
        let item_ids: Vec<String> = self
            .rankings
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if item_ids.is_empty() {
            return Err(FairRankError::EmptyInput(
                "rankings frame has no item columns".to_string(),
            ));
        }
        let n_rankings = self.rankings.height();
        if n_rankings == 0 {
            return Err(FairRankError::EmptyInput(
                "rankings frame has no rows".to_string(),
            ));
        }

        let group_by_id = self.attribute_map()?;
        let labels: Vec<String> = item_ids
            .iter()
            .map(|id| {
                group_by_id
                    .get(id)
                    .cloned()
                    .ok_or_else(|| FairRankError::MissingAttribute { item: id.clone() })
            })
            .collect::<Result<_, _>>()?;
        let groups = GroupIndex::from_labels(&labels);

        // Column-major score extraction; rows are materialized per ranking
        // inside the parallel loop.
        let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(item_ids.len());
        for name in &item_ids {
            let col = self.rankings.column(name)?.cast(&DataType::Float64)?;
            columns.push(col.f64()?.into_iter().collect());
        }

        let outcomes: Vec<Result<(Ranking, FairAssignment), FairRankError>> = (0..n_rankings)
            .into_par_iter()
            .map(|r| {
                let mut scores = Vec::with_capacity(item_ids.len());
                for (item, col) in columns.iter().enumerate() {
                    match col[r] {
                        Some(score) => scores.push(score),
                        None => {
                            return Err(FairRankError::MalformedRanking {
                                ranking: r,
                                detail: format!("missing score for item {}", item_ids[item]),
                            })
                        }
                    }
                }
                let original = if self.ascending {
                    Ranking::from_ranks(&scores)
                } else {
                    Ranking::from_scores(&scores)
                };
                let within = within_group_positions(&original, &groups);
                let bands = fair_bands(&within, &groups);
                let assignment = solve_fair_assignment(&original, &bands);
                Ok((original, assignment))
            })
            .collect();

        let mut candidates = Vec::new();
        let mut candidate_originals = Vec::new();
        let mut candidate_sources = Vec::new();
        let mut candidate_feasible = Vec::new();
        let mut skipped = Vec::new();
        for (r, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok((original, assignment)) => {
                    candidates.push(assignment.ranking);
                    candidate_originals.push(original);
                    candidate_sources.push(r);
                    candidate_feasible.push(assignment.feasible);
                }
                Err(err) => skipped.push(err.to_string()),
            }
        }
        if candidates.is_empty() {
            return Err(FairRankError::EmptyInput(
                "every source ranking failed validation".to_string(),
            ));
        }
        if !skipped.is_empty() {
            eprintln!(
                "Warning: {} out of {} source rankings failed and were skipped. Consensus is based on {} candidates.",
                skipped.len(),
                n_rankings,
                candidates.len()
            );
        }

        let choice = select_consensus(&candidates);
        let chosen = &candidates[choice.candidate];
        let fair_rank: Vec<usize> = (0..item_ids.len())
            .map(|item| chosen.position_of(item))
            .collect();
        let chosen_original = &candidate_originals[choice.candidate];
        let original_rank: Vec<usize> = (0..item_ids.len())
            .map(|item| chosen_original.position_of(item))
            .collect();

        Ok(ConsensusResults {
            item_ids,
            groups: labels,
            original_rank,
            fair_rank,
            chosen_ranking: candidate_sources[choice.candidate],
            min_total_distance: choice.total_distance,
            distance_matrix: choice.distance_matrix,
            candidate_sources,
            candidate_feasible,
            skipped,
        })
    }

    fn attribute_map(&self) -> Result<HashMap<String, String>, FairRankError> {
        let ids = self
            .attributes
            .column(&self.id)
            .map_err(|_| FairRankError::ColumnNotFound(self.id.clone()))?
            .cast(&DataType::String)?;
        let labels = self
            .attributes
            .column(&self.group)
            .map_err(|_| FairRankError::ColumnNotFound(self.group.clone()))?
            .cast(&DataType::String)?;
        let mut map = HashMap::with_capacity(self.attributes.height());
        for (id, label) in ids.str()?.into_iter().zip(labels.str()?.into_iter()) {
            if let (Some(id), Some(label)) = (id, label) {
                map.insert(id.to_string(), label.to_string());
            }
        }
        Ok(map)
    }
}

pub(crate) struct ConsensusChoice {
    pub candidate: usize,
    pub total_distance: u64,
    pub distance_matrix: Vec<Vec<u64>>,
}

/// Picks the candidate minimizing the sum of its pairwise Kendall-Tau
/// distances to every other candidate; ties go to the lowest index. The
/// pair distances are computed in parallel and folded into a symmetric
/// matrix, so the selection is invariant to completion order. This stage is
/// the scaling bottleneck of the whole pipeline: O(R^2 * n log n) over R
/// candidates of n items.
pub(crate) fn select_consensus(candidates: &[Ranking]) -> ConsensusChoice {
    let r = candidates.len();
    let mut pairs = Vec::with_capacity(r * (r.saturating_sub(1)) / 2);
    for i in 0..r {
        for j in (i + 1)..r {
            pairs.push((i, j));
        }
    }
    let distances: Vec<(usize, usize, u64)> = pairs
        .into_par_iter()
        .map(|(i, j)| (i, j, kendall_tau_distance(&candidates[i], &candidates[j])))
        .collect();

    let mut matrix = vec![vec![0u64; r]; r];
    for (i, j, d) in distances {
        matrix[i][j] = d;
        matrix[j][i] = d;
    }

    let mut candidate = 0;
    let mut total_distance = u64::MAX;
    for (i, row) in matrix.iter().enumerate() {
        let total: u64 = row.iter().sum();
        if total < total_distance {
            candidate = i;
            total_distance = total;
        }
    }
    ConsensusChoice {
        candidate,
        total_distance,
        distance_matrix: matrix,
    }
}

/// Holds the results of the multi-ranking consensus pipeline.
#[derive(Debug, Getters, Serialize)]
#[getset(get = "pub")]
pub struct ConsensusResults {
    /// Item identifiers, in rankings-frame column order.
    item_ids: Vec<String>,
    /// Protected-attribute label per item.
    groups: Vec<String>,
    /// Position per item in the chosen candidate's source ranking.
    original_rank: Vec<usize>,
    /// Fair position per item under the chosen candidate.
    fair_rank: Vec<usize>,
    /// Index of the source ranking whose fair re-ranking won the consensus.
    chosen_ranking: usize,
    /// Sum of the chosen candidate's distances to every other candidate.
    min_total_distance: u64,
    /// Symmetric pairwise distance matrix over the candidates (diagonal zero).
    distance_matrix: Vec<Vec<u64>>,
    /// Source ranking index of each candidate.
    candidate_sources: Vec<usize>,
    /// Whether each candidate stayed inside its fair bands.
    candidate_feasible: Vec<bool>,
    /// Reasons for source rankings that were skipped, one entry per skip.
    skipped: Vec<String>,
}

impl ConsensusResults {
    /// Prints a formatted summary of the consensus selection to the console.
    pub fn summary(&self) {
        println!("Fair Consensus Ranking Results");
        println!("========================================");
        println!("Items: {}", self.item_ids.len());
        println!(
            "Candidates: {} ({} source rankings skipped)",
            self.candidate_sources.len(),
            self.skipped.len()
        );
        println!("Chosen source ranking: {}", self.chosen_ranking);
        println!(
            "Min total Kendall-Tau distance: {}",
            self.min_total_distance
        );
        println!();

        let mut table = Table::new();
        table.set_header(vec!["Candidate", "Source ranking", "Total distance", "In-band"]);
        for (c, &source) in self.candidate_sources.iter().enumerate() {
            let total: u64 = self.distance_matrix[c].iter().sum();
            let marker = if source == self.chosen_ranking {
                format!("{} *", c)
            } else {
                c.to_string()
            };
            table.add_row(vec![
                Cell::new(marker),
                Cell::new(source),
                Cell::new(total),
                Cell::new(self.candidate_feasible[c]),
            ]);
        }
        println!("{}", table);
        for reason in &self.skipped {
            println!("Skipped: {}", reason);
        }
    }

    /// Per-item output frame: id, group, the chosen source's original rank
    /// and the fair rank, sorted by fair rank.
    pub fn to_dataframe(&self) -> Result<DataFrame, FairRankError> {
        let original: Vec<u32> = self.original_rank.iter().map(|&p| p as u32).collect();
        let ranks: Vec<u32> = self.fair_rank.iter().map(|&p| p as u32).collect();
        let df = DataFrame::new(vec![
            Series::new("id".into(), self.item_ids.clone()).into_column(),
            Series::new("group".into(), self.groups.clone()).into_column(),
            Series::new("original_rank".into(), original).into_column(),
            Series::new("fair_rank".into(), ranks).into_column(),
        ])?;
        Ok(df.sort(["fair_rank"], SortMultipleOptions::default())?)
    }

    /// Exports the selection diagnostics to a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("### Fair Consensus Ranking Results\n\n");
        md.push_str(&format!(
            "Chosen source ranking: {} (total distance {})\n\n",
            self.chosen_ranking, self.min_total_distance
        ));
        md.push_str("| Candidate | Source ranking | Total distance | In-band |\n");
        md.push_str("|---|---|---|---|\n");
        for (c, &source) in self.candidate_sources.iter().enumerate() {
            let total: u64 = self.distance_matrix[c].iter().sum();
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                c, source, total, self.candidate_feasible[c]
            ));
        }
        md
    }

    /// Exports the results to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_candidate_wins() {
        let candidates = vec![
            Ranking::from_order(vec![0, 1, 3, 2]),
            Ranking::from_order(vec![0, 1, 2, 3]),
            Ranking::from_order(vec![1, 0, 2, 3]),
        ];
        let choice = select_consensus(&candidates);
        assert_eq!(choice.candidate, 1);
        assert_eq!(choice.total_distance, 2);
        assert_eq!(choice.distance_matrix[0][2], 2);
        assert_eq!(choice.distance_matrix[2][0], 2);
        for (i, row) in choice.distance_matrix.iter().enumerate() {
            assert_eq!(row[i], 0);
        }
    }

    #[test]
    fn tie_goes_to_the_first_candidate() {
        let candidates = vec![
            Ranking::from_order(vec![0, 1, 2]),
            Ranking::from_order(vec![0, 1, 2]),
        ];
        let choice = select_consensus(&candidates);
        assert_eq!(choice.candidate, 0);
        assert_eq!(choice.total_distance, 0);
    }

    #[test]
    fn single_candidate_is_chosen_with_distance_zero() {
        let candidates = vec![Ranking::from_order(vec![2, 1, 0])];
        let choice = select_consensus(&candidates);
        assert_eq!(choice.candidate, 0);
        assert_eq!(choice.total_distance, 0);
    }
}
