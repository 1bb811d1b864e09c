//! Backend selection with the deterministic downgrade chain.

use crate::memory::core::request::SearchType;

/// Backend availability flags, resolved once at composition time from the
/// capability probe and injected; never re-probed per call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SearchCapabilities {
    /// Full-text index is present.
    pub exact: bool,
    /// Embedding provider is configured.
    pub semantic: bool,
}

/// Pick the effective backend for a requested search type.
///
/// Downgrade rules:
/// - semantic requested but unavailable: exact if available, else fallback
/// - exact requested but unavailable: fallback
/// - hybrid with both unavailable: fallback
/// - hybrid with exactly one available: that single backend
/// - otherwise the requested type is returned unchanged
#[must_use]
pub const fn select_search_type(
    requested: SearchType,
    capabilities: SearchCapabilities,
) -> SearchType {
    match requested {
        SearchType::Semantic => {
            if capabilities.semantic {
                SearchType::Semantic
            } else if capabilities.exact {
                SearchType::Exact
            } else {
                SearchType::Fallback
            }
        }
        SearchType::Exact => {
            if capabilities.exact {
                SearchType::Exact
            } else {
                SearchType::Fallback
            }
        }
        SearchType::Hybrid => match (capabilities.exact, capabilities.semantic) {
            (true, true) => SearchType::Hybrid,
            (true, false) => SearchType::Exact,
            (false, true) => SearchType::Semantic,
            (false, false) => SearchType::Fallback,
        },
        SearchType::Fallback => SearchType::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn caps(exact: bool, semantic: bool) -> SearchCapabilities {
        SearchCapabilities { exact, semantic }
    }

    // Exhaustive enumeration of (requested, exact, semantic) triples.
    #[test]
    fn test_selection_table() {
        use SearchType::{Exact, Fallback, Hybrid, Semantic};

        let table = [
            (Exact, caps(true, true), Exact),
            (Exact, caps(true, false), Exact),
            (Exact, caps(false, true), Fallback),
            (Exact, caps(false, false), Fallback),
            (Semantic, caps(true, true), Semantic),
            (Semantic, caps(false, true), Semantic),
            (Semantic, caps(true, false), Exact),
            (Semantic, caps(false, false), Fallback),
            (Hybrid, caps(true, true), Hybrid),
            (Hybrid, caps(true, false), Exact),
            (Hybrid, caps(false, true), Semantic),
            (Hybrid, caps(false, false), Fallback),
            (Fallback, caps(true, true), Fallback),
            (Fallback, caps(true, false), Fallback),
            (Fallback, caps(false, true), Fallback),
            (Fallback, caps(false, false), Fallback),
        ];

        for (requested, capabilities, expected) in table {
            assert_eq!(
                select_search_type(requested, capabilities),
                expected,
                "requested {requested:?} with {capabilities:?}"
            );
        }
    }
}
