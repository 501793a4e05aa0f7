// src/aggregate.rs - Per-sample bucket counting

use crate::hash::PADDING_BUCKET;
use std::collections::HashMap;

/// Collapse a bucket sequence into (bucket, occurrence count) pairs with
/// the padding bucket removed.
///
/// On short inputs padding can account for nearly the whole sequence; if
/// it reached the model it would swamp both the embedding average and
/// the count features, collapsing the output toward the bias terms.
///
/// The pairs are a multiset keyed by bucket; they come back sorted by
/// bucket index so repeated runs accumulate the embedding rows in the
/// same floating-point order.
pub fn aggregate(buckets: &[u32]) -> Vec<(u32, u32)> {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    for &bucket in buckets {
        *counts.entry(bucket).or_insert(0) += 1;
    }
    counts.remove(&*PADDING_BUCKET);

    let mut pairs: Vec<(u32, u32)> = counts.into_iter().collect();
    pairs.sort_by_key(|&(bucket, _)| bucket);
    pairs
}
