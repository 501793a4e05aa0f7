// src/rank.rs - Score-to-label ranking

/// Pair each score with the label at the same index and sort descending.
///
/// The sort is stable, so exact ties keep the labels' original index
/// order.
pub fn rank(scores: &[f32], labels: &[String]) -> Vec<(String, f32)> {
    let mut ranked: Vec<(String, f32)> = labels
        .iter()
        .cloned()
        .zip(scores.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    ranked
}
