//! Turning grounding metadata into a clean list of candidate citations.

use shared::grounding::GroundingMetadata;
use shared::research::Citation;
use std::collections::HashSet;

/// Default number of synthetic citations built from search queries.
pub const DEFAULT_FALLBACK_LIMIT: usize = 3;

const SEARCH_URL: &str = "https://www.google.com/search?q=";

/// Canonical form of a URL used only as a dedup key.
///
/// Lower-cases, strips any leading `http://` / `https://` (repeatedly),
/// drops the fragment and trailing slashes. Applying it twice changes nothing.
///
/// Lower-casing happens before the scheme strip, unlike a literal
/// case-sensitive prefix match, so `HTTPS://Example.com/Path#frag` and
/// `example.com/path/` share a key and the result stays idempotent.
pub fn normalize_url(url: &str) -> String {
    let lowered = url.to_lowercase();
    let mut rest = lowered.trim_start();
    loop {
        let stripped = rest
            .strip_prefix("http://")
            .or_else(|| rest.strip_prefix("https://"));
        match stripped {
            Some(s) => rest = s.trim_start(),
            None => break,
        }
    }
    let without_fragment = rest.split('#').next().unwrap_or_default();
    without_fragment
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

/// One citation per web chunk with a non-empty uri, deduplicated.
pub fn extract_citations(grounding: &GroundingMetadata) -> Vec<Citation> {
    let citations = grounding
        .grounding_chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
            let title = web
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(uri);
            Some(Citation {
                title: title.to_string(),
                url: uri.to_string(),
                description: web.description.clone(),
                original_url: web.original_url.clone(),
            })
        })
        .collect();
    dedupe_citations(citations)
}

/// Keep the first citation per normalized URL, in first-seen order.
pub fn dedupe_citations(citations: Vec<Citation>) -> Vec<Citation> {
    let mut seen = HashSet::new();
    citations
        .into_iter()
        .filter(|c| seen.insert(normalize_url(&c.url)))
        .collect()
}

/// Placeholder citations pointing at the searches the model ran.
pub fn fallback_citations(queries: &[String], limit: usize) -> Vec<Citation> {
    queries
        .iter()
        .take(limit)
        .map(|query| {
            Citation::new(
                format!("Search: {}", query),
                format!("{}{}", SEARCH_URL, urlencoding::encode(query)),
            )
        })
        .collect()
}

/// Extracted citations, or search-query placeholders when there are none.
///
/// The second element reports whether the fallback was used.
pub fn collect_citations(grounding: &GroundingMetadata, fallback_limit: usize) -> (Vec<Citation>, bool) {
    let citations = extract_citations(grounding);
    if citations.is_empty() && !grounding.web_search_queries.is_empty() {
        return (fallback_citations(&grounding.web_search_queries, fallback_limit), true);
    }
    (citations, false)
}
