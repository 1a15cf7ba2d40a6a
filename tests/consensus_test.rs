use fairank::{ConsensusBuilder, FairRankError};
use polars::prelude::*;

// With a single group, fp == n pins every item to its original position, so
// the fair ranking of each source equals the source itself. That makes the
// consensus stage directly observable from the input score rows.
fn single_group_attributes() -> DataFrame {
    df!(
        "id" => &["A", "B", "C", "D"],
        "protected" => &["only", "only", "only", "only"]
    )
    .unwrap()
}

#[test]
fn central_candidate_wins() {
    // Row orders: ABDC, ABCD, BACD. ABCD is at distance 1 from each of the
    // others, which sit at distance 2 from each other, so it is central.
    let rankings = df!(
        "A" => &[4.0, 4.0, 3.0],
        "B" => &[3.0, 3.0, 4.0],
        "C" => &[1.0, 2.0, 2.0],
        "D" => &[2.0, 1.0, 1.0]
    )
    .unwrap();
    let results = ConsensusBuilder::new(rankings, single_group_attributes(), "id", "protected")
        .run()
        .expect("consensus run failed");

    assert_eq!(*results.chosen_ranking(), 1);
    assert_eq!(*results.min_total_distance(), 2);
    // Chosen order ABCD: fair rank per item in column order A, B, C, D.
    assert_eq!(results.fair_rank(), &vec![1, 2, 3, 4]);

    results.summary();
}

#[test]
fn ascending_cells_are_read_as_rank_values() {
    // The central_candidate_wins fixture rewritten as rank values: row
    // orders ABDC, ABCD, BACD again, so the selection must be identical.
    let rankings = df!(
        "A" => &[1.0, 1.0, 2.0],
        "B" => &[2.0, 2.0, 1.0],
        "C" => &[4.0, 3.0, 3.0],
        "D" => &[3.0, 4.0, 4.0]
    )
    .unwrap();
    let results = ConsensusBuilder::new(rankings, single_group_attributes(), "id", "protected")
        .ascending(true)
        .run()
        .unwrap();

    assert_eq!(*results.chosen_ranking(), 1);
    assert_eq!(*results.min_total_distance(), 2);
    assert_eq!(results.fair_rank(), &vec![1, 2, 3, 4]);
}

#[test]
fn identical_candidates_give_zero_distance() {
    let rankings = df!(
        "A" => &[4.0, 4.0, 4.0],
        "B" => &[3.0, 3.0, 3.0],
        "C" => &[2.0, 2.0, 2.0],
        "D" => &[1.0, 1.0, 1.0]
    )
    .unwrap();
    let results = ConsensusBuilder::new(rankings, single_group_attributes(), "id", "protected")
        .run()
        .unwrap();

    assert_eq!(*results.chosen_ranking(), 0);
    assert_eq!(*results.min_total_distance(), 0);
    for row in results.distance_matrix() {
        assert!(row.iter().all(|&d| d == 0));
    }
}

#[test]
fn malformed_ranking_is_skipped_not_fatal() {
    let rankings = df!(
        "A" => &[None::<f64>, Some(4.0), Some(4.0)],
        "B" => &[Some(3.0), Some(3.0), Some(3.0)],
        "C" => &[Some(2.0), Some(2.0), Some(2.0)],
        "D" => &[Some(1.0), Some(1.0), Some(1.0)]
    )
    .unwrap();
    let results = ConsensusBuilder::new(rankings, single_group_attributes(), "id", "protected")
        .run()
        .unwrap();

    assert_eq!(results.skipped().len(), 1);
    assert!(results.skipped()[0].contains("ranking 0"));
    assert!(results.skipped()[0].contains("item A"));
    assert_eq!(results.candidate_sources(), &vec![1, 2]);
    assert_eq!(*results.min_total_distance(), 0);
}

#[test]
fn all_rankings_failing_is_an_error() {
    let rankings = df!(
        "A" => &[None::<f64>, None::<f64>],
        "B" => &[Some(1.0), Some(2.0)]
    )
    .unwrap();
    let attributes = df!(
        "id" => &["A", "B"],
        "protected" => &["only", "only"]
    )
    .unwrap();
    match ConsensusBuilder::new(rankings, attributes, "id", "protected").run() {
        Err(FairRankError::EmptyInput(_)) => {}
        other => panic!("expected EmptyInput, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_attribute_aborts_the_run() {
    let rankings = df!(
        "A" => &[2.0],
        "B" => &[1.0]
    )
    .unwrap();
    let attributes = df!(
        "id" => &["A"],
        "protected" => &["only"]
    )
    .unwrap();
    match ConsensusBuilder::new(rankings, attributes, "id", "protected").run() {
        Err(FairRankError::MissingAttribute { item }) => assert_eq!(item, "B"),
        other => panic!("expected MissingAttribute, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn two_group_candidates_are_fair_and_comparable() {
    // A, B carry one label and C, D the other; every candidate must spread
    // the groups across both halves regardless of its source order.
    let rankings = df!(
        "A" => &[4.0, 1.0, 4.0],
        "B" => &[3.0, 2.0, 1.0],
        "C" => &[2.0, 4.0, 3.0],
        "D" => &[1.0, 3.0, 2.0]
    )
    .unwrap();
    let attributes = df!(
        "id" => &["A", "B", "C", "D"],
        "protected" => &["g0", "g0", "g1", "g1"]
    )
    .unwrap();
    let results = ConsensusBuilder::new(rankings, attributes, "id", "protected")
        .run()
        .unwrap();

    assert!(results.candidate_feasible().iter().all(|&f| f));
    assert_eq!(results.skipped().len(), 0);

    // Distance matrix is symmetric with a zero diagonal.
    let matrix = results.distance_matrix();
    for i in 0..matrix.len() {
        assert_eq!(matrix[i][i], 0);
        for j in 0..matrix.len() {
            assert_eq!(matrix[i][j], matrix[j][i]);
        }
    }

    // The bands put one member of each group into positions {1, 2} and one
    // into {3, 4}; the chosen fair ranking must respect that split.
    let mut by_rank: Vec<usize> = (0..4).collect();
    by_rank.sort_by_key(|&i| results.fair_rank()[i]);
    let labels: Vec<&str> = by_rank
        .iter()
        .map(|&i| results.groups()[i].as_str())
        .collect();
    for half in labels.chunks(2) {
        assert!(half.contains(&"g0") && half.contains(&"g1"));
    }
}

#[test]
fn output_carries_the_chosen_sources_original_rank() {
    // Single candidate ABCD with paired groups: the fair assignment moves C
    // ahead of B (fair order ACBD), so original and fair ranks diverge.
    let rankings = df!(
        "A" => &[4.0],
        "B" => &[3.0],
        "C" => &[2.0],
        "D" => &[1.0]
    )
    .unwrap();
    let attributes = df!(
        "id" => &["A", "B", "C", "D"],
        "protected" => &["g0", "g0", "g1", "g1"]
    )
    .unwrap();
    let results = ConsensusBuilder::new(rankings, attributes, "id", "protected")
        .run()
        .unwrap();

    assert_eq!(results.original_rank(), &vec![1, 2, 3, 4]);
    assert_eq!(results.fair_rank(), &vec![1, 3, 2, 4]);

    // Sorted by fair rank the item order is A, C, B, D.
    let out = results.to_dataframe().unwrap();
    let original: Vec<u32> = out
        .column("original_rank")
        .unwrap()
        .u32()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(original, vec![1, 3, 2, 4]);
}

#[test]
fn consensus_output_frame_is_sorted_by_fair_rank() {
    let rankings = df!(
        "A" => &[1.0, 2.0],
        "B" => &[2.0, 1.0]
    )
    .unwrap();
    let attributes = df!(
        "id" => &["A", "B"],
        "protected" => &["only", "only"]
    )
    .unwrap();
    let results = ConsensusBuilder::new(rankings, attributes, "id", "protected")
        .run()
        .unwrap();
    let out = results.to_dataframe().unwrap();
    let ranks: Vec<u32> = out
        .column("fair_rank")
        .unwrap()
        .u32()
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(ranks, vec![1, 2]);

    let json = results.to_json().unwrap();
    assert!(json.contains("chosen_ranking"));
    assert!(!results.to_markdown().is_empty());
}
