//! Fairness-constrained re-ranking of scored items.
//!
//! This library re-ranks a scored item list so that a protected attribute is
//! distributed proportionally across rank positions. Each item may only
//! occupy positions inside a fair band derived from its rank within its own
//! group and the group's share of the population; a minimum-weight perfect
//! matching then picks the band-respecting ranking closest to the original
//! order. When several independent rankings of the same items exist, the
//! consensus variant re-ranks each one and keeps the fair ranking with the
//! smallest total Kendall-Tau distance to the rest.
//!
//! # Example
//!
//! ```ignore
//! use polars::prelude::*;
//! use fairank::FairRankBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let df = df!(
//!         "id" => &["a", "b", "c", "d"],
//!         "score" => &[4.0, 3.0, 2.0, 1.0],
//!         "protected" => &["m", "m", "f", "f"]
//!     )?;
//!
//!     let results = FairRankBuilder::new(df, "id", "score", "protected").run()?;
//!     results.summary();
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use comfy_table::{Cell, Table};
use getset::Getters;
use polars::prelude::*;
use serde::Serialize;

pub mod consensus;
pub mod rank;

pub use crate::consensus::{ConsensusBuilder, ConsensusResults};
pub use crate::rank::assignment::{prohibitive_cost, solve_fair_assignment, FairAssignment};
pub use crate::rank::bands::{fair_band, fair_bands, FairBand};
pub use crate::rank::distance::{kendall_tau_distance, max_discordant_pairs};
pub use crate::rank::grouping::{within_group_positions, GroupIndex};
pub use crate::rank::ordering::Ranking;

/// Error type for the `fairank` library.
#[derive(Debug)]
pub enum FairRankError {
    /// Wraps a `PolarsError`.
    PolarsError(PolarsError),
    /// A required column does not exist in the input frame.
    ColumnNotFound(String),
    /// An item referenced by a ranking has no protected-attribute label.
    MissingAttribute { item: String },
    /// A ranking has duplicate, missing, or unscorable items.
    MalformedRanking { ranking: usize, detail: String },
    /// The input contains no usable rankings or items.
    EmptyInput(String),
}

impl From<PolarsError> for FairRankError {
    fn from(err: PolarsError) -> Self {
        FairRankError::PolarsError(err)
    }
}

impl fmt::Display for FairRankError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FairRankError::PolarsError(e) => write!(f, "Polars error: {}", e),
            FairRankError::ColumnNotFound(s) => write!(f, "Column not found: {}", s),
            FairRankError::MissingAttribute { item } => {
                write!(f, "Item {} has no protected-attribute label", item)
            }
            FairRankError::MalformedRanking { ranking, detail } => {
                write!(f, "Malformed ranking {}: {}", ranking, detail)
            }
            FairRankError::EmptyInput(s) => write!(f, "Empty input: {}", s),
        }
    }
}

impl std::error::Error for FairRankError {}

/// The entry point for configuring and running a single-ranking fairness
/// pass over a `polars::DataFrame`.
#[derive(Debug, Clone)]
pub struct FairRankBuilder {
    dataframe: DataFrame,
    id: String,
    score: String,
    group: String,
}

impl FairRankBuilder {
    /// # Arguments
    ///
    /// * `dataframe` - one row per item; columns other than the three named
    ///   ones pass through to the output frame untouched.
    /// * `id` - column holding the unique item identifier.
    /// * `score` - column holding the ranking score (higher is better).
    /// * `group` - column holding the protected attribute.
    pub fn new(dataframe: DataFrame, id: &str, score: &str, group: &str) -> Self {
        Self {
            dataframe,
            id: id.to_string(),
            score: score.to_string(),
            group: group.to_string(),
        }
    }

    /// Validates the input, computes the fair re-ranking, and reports the
    /// Kendall-Tau distance between the original and fair orders.
    pub fn run(&self) -> Result<FairRankResults, FairRankError> {
        let df = &self.dataframe;
        if df.height() == 0 {
            return Err(FairRankError::EmptyInput(
                "input frame has no rows".to_string(),
            ));
        }

        let mut ids = Vec::with_capacity(df.height());
        for (row, id) in self.string_column(&self.id)?.into_iter().enumerate() {
            match id {
                Some(id) => ids.push(id),
                None => {
                    return Err(FairRankError::MalformedRanking {
                        ranking: 0,
                        detail: format!("missing item id at row {}", row),
                    })
                }
            }
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(FairRankError::MalformedRanking {
                    ranking: 0,
                    detail: format!("duplicate item id {}", id),
                });
            }
        }

        let mut labels = Vec::with_capacity(df.height());
        for (row, label) in self.string_column(&self.group)?.into_iter().enumerate() {
            match label {
                Some(label) => labels.push(label),
                None => {
                    return Err(FairRankError::MissingAttribute {
                        item: ids[row].clone(),
                    })
                }
            }
        }

        let score_col = df
            .column(&self.score)
            .map_err(|_| FairRankError::ColumnNotFound(self.score.clone()))?
            .cast(&DataType::Float64)?;
        let mut scores = Vec::with_capacity(df.height());
        for (row, value) in score_col.f64()?.into_iter().enumerate() {
            match value {
                Some(value) => scores.push(value),
                None => {
                    return Err(FairRankError::MalformedRanking {
                        ranking: 0,
                        detail: format!("missing score for item {}", ids[row]),
                    })
                }
            }
        }

        let original = Ranking::from_scores(&scores);
        let groups = GroupIndex::from_labels(&labels);
        let within = within_group_positions(&original, &groups);
        let bands = fair_bands(&within, &groups);
        let assignment = solve_fair_assignment(&original, &bands);
        let kendall_tau = kendall_tau_distance(&original, &assignment.ranking);

        let original_rank: Vec<usize> = (0..ids.len()).map(|i| original.position_of(i)).collect();
        let new_rank: Vec<usize> = (0..ids.len())
            .map(|i| assignment.ranking.position_of(i))
            .collect();

        Ok(FairRankResults {
            dataframe: df.clone(),
            ids,
            groups: labels,
            original_rank,
            new_rank,
            kendall_tau,
            total_cost: assignment.total_cost,
            feasible: assignment.feasible,
        })
    }

    fn string_column(&self, name: &str) -> Result<Vec<Option<String>>, FairRankError> {
        let col = self
            .dataframe
            .column(name)
            .map_err(|_| FairRankError::ColumnNotFound(name.to_string()))?
            .cast(&DataType::String)?;
        Ok(col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect())
    }
}

/// Holds the results of a single-ranking fairness pass.
#[derive(Debug, Getters, Serialize)]
#[getset(get = "pub")]
pub struct FairRankResults {
    /// The input frame, kept so pass-through columns survive to the output.
    #[serde(skip)]
    #[getset(skip)]
    dataframe: DataFrame,
    /// Item identifiers in input row order.
    ids: Vec<String>,
    /// Protected-attribute label per item.
    groups: Vec<String>,
    /// Score-order rank per item (1 is best).
    original_rank: Vec<usize>,
    /// Fair rank per item.
    new_rank: Vec<usize>,
    /// Kendall-Tau distance between the original and fair rankings.
    kendall_tau: u64,
    /// Total displacement cost of the matching.
    total_cost: i64,
    /// False when the fair bands admit no in-band perfect matching. The
    /// fair ranking is still a bijection, but at least one item sits outside
    /// its band; whether to trust it is the caller's decision.
    feasible: bool,
}

impl FairRankResults {
    /// Prints a formatted summary of the re-ranking to the console.
    pub fn summary(&self) {
        println!("Fair Re-Ranking Results");
        println!("========================================");
        println!("Items: {}", self.ids.len());
        println!(
            "Kendall-Tau distance (original vs fair): {}",
            self.kendall_tau
        );
        println!("Total displacement cost: {}", self.total_cost);
        if !self.feasible {
            println!(
                "Warning: fair bands were infeasible; at least one item sits outside its band."
            );
        }
        println!();

        let mut table = Table::new();
        table.set_header(vec!["Item", "Group", "Original rank", "Fair rank"]);
        let mut by_fair_rank: Vec<usize> = (0..self.ids.len()).collect();
        by_fair_rank.sort_by_key(|&i| self.new_rank[i]);
        let shown = by_fair_rank.len().min(20);
        for &i in by_fair_rank.iter().take(shown) {
            table.add_row(vec![
                Cell::new(&self.ids[i]),
                Cell::new(&self.groups[i]),
                Cell::new(self.original_rank[i]),
                Cell::new(self.new_rank[i]),
            ]);
        }
        println!("{}", table);
        if self.ids.len() > shown {
            println!("... ({} more items)", self.ids.len() - shown);
        }
    }

    /// The input frame plus `original_rank` and `new_rank` columns, sorted
    /// by the fair rank.
    pub fn to_dataframe(&self) -> Result<DataFrame, FairRankError> {
        let original: Vec<u32> = self.original_rank.iter().map(|&p| p as u32).collect();
        let fair: Vec<u32> = self.new_rank.iter().map(|&p| p as u32).collect();
        let out = self.dataframe.hstack(&[
            Series::new("original_rank".into(), original).into_column(),
            Series::new("new_rank".into(), fair).into_column(),
        ])?;
        Ok(out.sort(["new_rank"], SortMultipleOptions::default())?)
    }

    /// Exports the re-ranking to a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("### Fair Re-Ranking Results\n\n");
        md.push_str(&format!(
            "Kendall-Tau distance (original vs fair): {}\n\n",
            self.kendall_tau
        ));
        md.push_str("| Item | Group | Original rank | Fair rank |\n");
        md.push_str("|---|---|---|---|\n");
        let mut by_fair_rank: Vec<usize> = (0..self.ids.len()).collect();
        by_fair_rank.sort_by_key(|&i| self.new_rank[i]);
        for i in by_fair_rank {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                self.ids[i], self.groups[i], self.original_rank[i], self.new_rank[i]
            ));
        }
        md
    }

    /// Exports the results to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
