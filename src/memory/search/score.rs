//! Score normalization shared by the search engines.

/// Divisor applied to raw index ranks before clamping.
const RANK_DIVISOR: f64 = 10.0;
/// Score floor for indexed matches: presence in the index is never a
/// zero-relevance result.
const RANK_FLOOR: f64 = 0.1;

/// Map a backend-native rank signal onto [0.1, 1.0].
///
/// FTS5 bm25 ranks are negative with larger magnitude meaning more
/// relevant, so the absolute value is taken first.
#[must_use]
pub fn normalize_rank(raw_rank: f64) -> f64 {
    (raw_rank.abs() / RANK_DIVISOR).clamp(RANK_FLOOR, 1.0)
}

/// Cosine similarity between a query vector and a stored embedding.
///
/// Returns `None` when the dimensions differ or either vector has zero
/// norm; such candidates are skipped rather than scored.
#[must_use]
pub fn cosine_similarity(query: &[f64], stored: &[f32]) -> Option<f64> {
    if query.len() != stored.len() || query.is_empty() {
        return None;
    }

    let mut dot = 0.0_f64;
    let mut query_norm = 0.0_f64;
    let mut stored_norm = 0.0_f64;
    for (q, s) in query.iter().zip(stored) {
        let s = f64::from(*s);
        dot += q * s;
        query_norm += q * q;
        stored_norm += s * s;
    }

    let denom = query_norm.sqrt() * stored_norm.sqrt();
    if denom == 0.0 {
        return None;
    }

    Some(dot / denom)
}
