//! Final ordering of merged papers.

use crate::models::{Paper, SortBy};

/// Sort papers in place.
///
/// Relevance keeps the merged order. Date and citation count sort
/// descending; both are stable, so ties keep their merged order. A missing
/// citation count ranks as zero.
pub fn sort_papers(papers: &mut [Paper], sort_by: SortBy) {
    match sort_by {
        SortBy::Relevance => {}
        SortBy::Date => papers.sort_by(|a, b| b.published_date().cmp(&a.published_date())),
        SortBy::CitationCount => papers.sort_by(|a, b| {
            b.citation_count()
                .unwrap_or(0)
                .cmp(&a.citation_count().unwrap_or(0))
        }),
    }
}
