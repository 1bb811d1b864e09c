//! Pagination over fully-ranked result sets.

/// Marker limit meaning "the full set"; engines invoked by the hybrid
/// combiner run unwindowed so the post-merge ranking stays sound.
pub const NO_LIMIT: usize = usize::MAX;

/// Window an already-ranked set, returning the page and the pre-window
/// total.
#[must_use]
pub fn window<T>(items: Vec<T>, offset: usize, limit: usize) -> (Vec<T>, usize) {
    let total = items.len();
    let end = offset.saturating_add(limit).min(total);
    let start = offset.min(total);
    let page = items
        .into_iter()
        .skip(start)
        .take(end - start)
        .collect();
    (page, total)
}
