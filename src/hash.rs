// src/hash.rs - Hashed bag-of-bigrams feature extraction

use lazy_static::lazy_static;

/// Number of hash buckets in the bigram vocabulary
pub const VOCABULARY_SIZE: usize = 5000;

/// Fixed length of the bucket sequence fed to the model
pub const NB_TOKENS: usize = 10000;

/// Window width of one token, in bytes
pub const N_GRAM: usize = 2;

/// Dense embedding width: max(10, floor(sqrt(VOCABULARY_SIZE)))
pub const EMBEDDING_SIZE: usize = 70;

lazy_static! {
    /// Bucket the empty padding token hashes into. Inputs shorter than
    /// NB_TOKENS are filled with this bucket, and the aggregator strips
    /// it back out before the model sees the sample.
    pub static ref PADDING_BUCKET: u32 = bucket_of(b"");
}

/// Map one token to its hash bucket.
fn bucket_of(token: &[u8]) -> u32 {
    (farmhash::fingerprint64(token) % VOCABULARY_SIZE as u64) as u32
}

/// Hash raw text into a fixed-length sequence of bucket indices.
///
/// Each window of two consecutive bytes becomes one token: the two bytes
/// joined by a single ASCII space. The space separator is part of the
/// token encoding the weights were trained against; hashing the two
/// bytes back-to-back lands every token in a different bucket.
///
/// Defined for any byte sequence. Inputs of zero or one byte produce no
/// tokens, so the whole sequence is the padding bucket.
pub fn hash_text(bytes: &[u8]) -> Vec<u32> {
    let mut buckets = Vec::with_capacity(NB_TOKENS);

    if bytes.len() >= N_GRAM {
        let mut token = [0u8; 3];
        token[1] = b' ';
        for window in bytes.windows(N_GRAM).take(NB_TOKENS) {
            token[0] = window[0];
            token[2] = window[1];
            buckets.push(bucket_of(&token));
        }
    }

    while buckets.len() < NB_TOKENS {
        buckets.push(*PADDING_BUCKET);
    }

    buckets
}
