//! Basic usage example for the Hedwig library.
//!
//! Searches arXiv, OpenAlex and Crossref at once and prints the merged,
//! deduplicated list together with each source's outcome.

use hedwig::config::Config;
use hedwig::models::{SearchRequest, SortBy};
use hedwig::Aggregator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let aggregator = Aggregator::from_config(&Config::default())?;

    println!("Initialized {} research sources\n", aggregator.registry().len());

    let request = SearchRequest::new("machine learning transformers")
        .max_results(5)
        .date_from("2020-01-01")
        .sort_by(SortBy::CitationCount);

    let report = aggregator.search_request(request).await?;

    for (source, result) in &report.sources {
        match &result.error {
            None => println!("{}: {} papers", source, result.count),
            Some(error) => eprintln!("{}: failed ({})", source, error),
        }
    }

    println!("\nTotal papers after merge: {}", report.total_results);

    for (i, paper) in report.papers.iter().enumerate() {
        println!("\n{}. {}", i + 1, paper.title());
        println!("   Authors: {}", paper.formatted_authors());
        println!("   Published: {}", paper.published_date().format("%Y-%m-%d"));
        if let Some(doi) = paper.doi() {
            println!("   DOI: {}", doi);
        }
        if let Some(citations) = paper.citation_count() {
            println!("   Citations: {}", citations);
        }
        println!("   Source: {}", paper.source().name());
        println!("   URL: {}", paper.url());
    }

    Ok(())
}
