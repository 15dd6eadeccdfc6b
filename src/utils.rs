use rand::{rngs::StdRng, SeedableRng};

/// Index of the largest value, ties resolved in favor of the first occurrence
/// Returns None for an empty slice
pub fn argmax_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub fn midpoint(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// RNG stream that draws agent values
pub const VALUE_STREAM: u64 = 1;
/// RNG stream that draws per-agent tie-break priorities
pub const TIE_BREAK_STREAM: u64 = 2;

/// Create a deterministic RNG for member `index` of one stream of a run
///
/// The run seed, the stream and the index fill separate words of the 256-bit key,
/// so no two distinct triples share a sequence.
pub fn seeded_rng(seed: u64, stream: u64, index: u64) -> StdRng {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    key[8..16].copy_from_slice(&stream.to_le_bytes());
    key[16..24].copy_from_slice(&index.to_le_bytes());
    StdRng::from_seed(key)
}
