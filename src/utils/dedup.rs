//! Deduplication of papers merged from several sources.

use std::collections::HashSet;

use crate::models::Paper;

/// Check whether `paper` duplicates something already kept.
///
/// Two papers are duplicates when their DOIs are equal (exact, case-sensitive)
/// or their normalized titles are equal. No fuzzy matching is done.
fn is_duplicate(paper: &Paper, seen_dois: &HashSet<String>, seen_titles: &HashSet<String>) -> bool {
    if let Some(doi) = paper.doi() {
        if seen_dois.contains(doi) {
            return true;
        }
    }
    seen_titles.contains(&paper.normalized_title())
}

/// Remove duplicate papers, keeping the first occurrence.
///
/// The relative order of the kept papers is preserved.
pub fn deduplicate_papers(papers: Vec<Paper>) -> Vec<Paper> {
    let mut seen_dois: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(papers.len());

    for paper in papers {
        if is_duplicate(&paper, &seen_dois, &seen_titles) {
            tracing::trace!(id = paper.id(), "Dropping duplicate paper");
            continue;
        }
        if let Some(doi) = paper.doi() {
            seen_dois.insert(doi.to_string());
        }
        seen_titles.insert(paper.normalized_title());
        unique.push(paper);
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::sources::mock::{make_paper, paper_builder};

    #[test]
    fn test_doi_duplicate_removed() {
        let papers = vec![
            paper_builder(SourceType::OpenAlex, "W1", "Deep Learning")
                .doi("10.1000/xyz")
                .build()
                .unwrap(),
            paper_builder(SourceType::CrossRef, "10.1000/xyz", "Deep learning: a review")
                .doi("10.1000/xyz")
                .build()
                .unwrap(),
        ];

        let unique = deduplicate_papers(papers);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].source(), SourceType::OpenAlex);
    }

    #[test]
    fn test_doi_comparison_is_case_sensitive() {
        let papers = vec![
            paper_builder(SourceType::OpenAlex, "W1", "First")
                .doi("10.1000/ABC")
                .build()
                .unwrap(),
            paper_builder(SourceType::CrossRef, "x", "Second")
                .doi("10.1000/abc")
                .build()
                .unwrap(),
        ];

        assert_eq!(deduplicate_papers(papers).len(), 2);
    }

    #[test]
    fn test_title_duplicate_removed() {
        let papers = vec![
            make_paper(SourceType::Arxiv, "1", "Attention Is All You Need"),
            make_paper(SourceType::OpenAlex, "W2", "  attention is all you need "),
            make_paper(SourceType::CrossRef, "3", "Attention is all you need!"),
        ];

        let unique = deduplicate_papers(papers);
        let ids: Vec<&str> = unique.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["arxiv:1", "crossref:3"]);
    }

    #[test]
    fn test_order_preserved() {
        let papers = vec![
            make_paper(SourceType::Arxiv, "1", "C"),
            make_paper(SourceType::Arxiv, "2", "A"),
            make_paper(SourceType::Arxiv, "3", "c"),
            make_paper(SourceType::Arxiv, "4", "B"),
        ];

        let unique = deduplicate_papers(papers);
        let ids: Vec<&str> = unique.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["arxiv:1", "arxiv:2", "arxiv:4"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate_papers(Vec::new()).is_empty());
    }
}
