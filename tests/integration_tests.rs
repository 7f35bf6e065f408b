//! Integration tests for Hedwig
//!
//! These tests drive the aggregator end to end, first over mock sources and
//! then over the real adapters pointed at a local HTTP mock.

use hedwig::config::Config;
use hedwig::mcp::{McpServer, ToolRegistry};
use hedwig::models::{SearchQuery, SearchRequest, SortBy, SourceType};
use hedwig::sources::mock::{make_paper, paper_builder};
use hedwig::sources::{MockSource, SourceCapabilities, SourceRegistry};
use hedwig::Aggregator;
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn aggregator(sources: Vec<MockSource>) -> Aggregator {
    let mut registry = SourceRegistry::empty();
    for source in sources {
        registry.register(Arc::new(source));
    }
    Aggregator::new(registry)
}

fn all_sources() -> SearchQuery {
    SearchQuery::new("graph neural networks").unwrap()
}

/// Merged order follows the enabled-source order, not completion order
#[tokio::test]
async fn test_merge_order_independent_of_completion_order() {
    let aggregator = aggregator(vec![
        MockSource::new(SourceType::Arxiv)
            .with_papers(vec![make_paper(SourceType::Arxiv, "1", "Slowest")])
            .with_delay(Duration::from_millis(150)),
        MockSource::new(SourceType::OpenAlex)
            .with_papers(vec![make_paper(SourceType::OpenAlex, "W1", "Fastest")]),
        MockSource::new(SourceType::CrossRef)
            .with_papers(vec![make_paper(SourceType::CrossRef, "c1", "Middle")])
            .with_delay(Duration::from_millis(50)),
    ]);

    let report = aggregator.search(&all_sources()).await;

    let ids: Vec<&str> = report.papers.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["arxiv:1", "openalex:W1", "crossref:c1"]);
}

/// Sources are queried concurrently
#[tokio::test]
async fn test_sources_queried_concurrently() {
    let delay = Duration::from_millis(200);
    let aggregator = aggregator(
        SourceType::ALL
            .iter()
            .map(|&s| {
                MockSource::new(s)
                    .with_papers(vec![make_paper(s, "1", &format!("Paper from {}", s.id()))])
                    .with_delay(delay)
            })
            .collect(),
    );

    let started = Instant::now();
    let report = aggregator.search(&all_sources()).await;
    let elapsed = started.elapsed();

    assert_eq!(report.total_results, 3);
    assert!(
        elapsed < delay * 2,
        "three 200ms sources took {:?}; they were not run concurrently",
        elapsed
    );
}

/// One failing source does not affect the others
#[tokio::test]
async fn test_failure_isolation() {
    let aggregator = aggregator(vec![
        MockSource::new(SourceType::Arxiv)
            .with_papers(vec![make_paper(SourceType::Arxiv, "1", "Kept")]),
        MockSource::new(SourceType::OpenAlex).failing("connection refused"),
        MockSource::new(SourceType::CrossRef)
            .with_papers(vec![make_paper(SourceType::CrossRef, "c1", "Also kept")]),
    ]);

    let report = aggregator.search(&all_sources()).await;

    assert_eq!(report.total_results, 2);
    let openalex = report.source(SourceType::OpenAlex).unwrap();
    assert!(openalex.is_failure());
    assert_eq!(openalex.count, 0);
    assert!(openalex.papers.is_empty());
    assert!(openalex.error.as_deref().unwrap().contains("connection refused"));

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "openalex");
}

/// A panicking adapter is reported like any other failure
#[tokio::test]
async fn test_panic_isolation() {
    let aggregator = aggregator(vec![
        MockSource::new(SourceType::Arxiv)
            .with_papers(vec![make_paper(SourceType::Arxiv, "1", "Survivor")]),
        MockSource::new(SourceType::OpenAlex).panicking(),
        MockSource::new(SourceType::CrossRef),
    ]);

    let report = aggregator.search(&all_sources()).await;

    assert_eq!(report.total_results, 1);
    let error = report.source(SourceType::OpenAlex).unwrap().error.clone().unwrap();
    assert!(error.starts_with("source task failed"), "got: {}", error);
    assert!(!report.source(SourceType::CrossRef).unwrap().is_failure());
}

/// Every source failing still yields a report, with no papers
#[tokio::test]
async fn test_all_sources_failing() {
    let aggregator = aggregator(
        SourceType::ALL
            .iter()
            .map(|&s| MockSource::new(s).failing("down"))
            .collect(),
    );

    let report = aggregator.search(&all_sources()).await;

    assert_eq!(report.total_results, 0);
    assert!(report.papers.is_empty());
    assert_eq!(report.failures().count(), 3);
}

/// The first occurrence of a duplicate wins, by DOI and by title
#[tokio::test]
async fn test_cross_source_deduplication() {
    let aggregator = aggregator(vec![
        MockSource::new(SourceType::Arxiv).with_papers(vec![
            paper_builder(SourceType::Arxiv, "1", "Preprint title")
                .doi("10.1000/shared")
                .build()
                .unwrap(),
            make_paper(SourceType::Arxiv, "2", "Attention Is All You Need"),
        ]),
        MockSource::new(SourceType::OpenAlex).with_papers(vec![make_paper(
            SourceType::OpenAlex,
            "W1",
            "  attention is all you need ",
        )]),
        MockSource::new(SourceType::CrossRef).with_papers(vec![
            paper_builder(SourceType::CrossRef, "c1", "Published title")
                .doi("10.1000/shared")
                .citation_count(10)
                .build()
                .unwrap(),
            paper_builder(SourceType::CrossRef, "c2", "Different case DOI")
                .doi("10.1000/SHARED")
                .build()
                .unwrap(),
        ]),
    ]);

    let report = aggregator.search(&all_sources()).await;

    let ids: Vec<&str> = report.papers.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["arxiv:1", "arxiv:2", "crossref:c2"]);

    // per-source counts are taken before deduplication
    assert_eq!(report.source(SourceType::OpenAlex).unwrap().count, 1);
    assert_eq!(report.source(SourceType::CrossRef).unwrap().count, 2);
}

/// Citation sorting is descending and stable, with missing counts as zero
#[tokio::test]
async fn test_citation_sort_is_stable() {
    let aggregator = aggregator(vec![
        MockSource::new(SourceType::Arxiv).with_papers(vec![
            make_paper(SourceType::Arxiv, "no-count", "No count"),
            paper_builder(SourceType::Arxiv, "five-a", "Five A")
                .citation_count(5)
                .build()
                .unwrap(),
        ]),
        MockSource::new(SourceType::OpenAlex).with_papers(vec![
            paper_builder(SourceType::OpenAlex, "zero", "Zero")
                .citation_count(0)
                .build()
                .unwrap(),
            paper_builder(SourceType::OpenAlex, "five-b", "Five B")
                .citation_count(5)
                .build()
                .unwrap(),
            paper_builder(SourceType::OpenAlex, "many", "Many")
                .citation_count(500)
                .build()
                .unwrap(),
        ]),
    ]);

    let query = SearchRequest::new("q")
        .sources(["arxiv", "openalex"])
        .sort_by(SortBy::CitationCount)
        .validate()
        .unwrap();
    let report = aggregator.search(&query).await;

    let ids: Vec<&str> = report.papers.iter().map(|p| p.id()).collect();
    assert_eq!(
        ids,
        vec![
            "openalex:many",
            "arxiv:five-a",
            "openalex:five-b",
            "arxiv:no-count",
            "openalex:zero"
        ]
    );
}

/// The final list never exceeds max_results
#[tokio::test]
async fn test_truncation_to_max_results() {
    let papers = (0..20)
        .map(|i| make_paper(SourceType::Arxiv, &i.to_string(), &format!("Paper {}", i)))
        .collect();
    let aggregator = aggregator(vec![MockSource::new(SourceType::Arxiv).with_papers(papers)]);

    let query = SearchRequest::new("q")
        .sources(["arxiv"])
        .max_results(5)
        .validate()
        .unwrap();
    let report = aggregator.search(&query).await;

    assert_eq!(report.total_results, 5);
    assert_eq!(report.papers.len(), 5);
    assert_eq!(report.source(SourceType::Arxiv).unwrap().count, 20);
    assert_eq!(report.papers[4].id(), "arxiv:4");
}

/// Invalid requests are rejected before any source is contacted
#[tokio::test]
async fn test_validation_contacts_no_source() {
    let arxiv = Arc::new(MockSource::new(SourceType::Arxiv));
    let mut registry = SourceRegistry::empty();
    registry.register(arxiv.clone());
    let aggregator = Aggregator::new(registry);

    let invalid = vec![
        SearchRequest::new(""),
        SearchRequest::new("q").max_results(0),
        SearchRequest::new("q").max_results(51),
        SearchRequest::new("q").sources(["scopus"]),
        SearchRequest::new("q").date_from("yesterday"),
        SearchRequest::new("q").date_from("2024-01-01").date_to("2023-01-01"),
        SearchRequest::new("x".repeat(501)),
    ];

    for request in invalid {
        let err = aggregator.search_request(request.clone()).await.unwrap_err();
        assert!(err.is_validation(), "{:?} gave {}", request, err);
    }
    assert_eq!(arxiv.calls(), 0);
}

/// Only the selected sources are searched and reported
#[tokio::test]
async fn test_source_selection() {
    let arxiv = Arc::new(MockSource::new(SourceType::Arxiv));
    let crossref = Arc::new(MockSource::new(SourceType::CrossRef));
    let mut registry = SourceRegistry::empty();
    registry.register(arxiv.clone());
    registry.register(crossref.clone());
    let aggregator = Aggregator::new(registry);

    let report = aggregator
        .search_request(SearchRequest::new("q").sources(["crossref"]))
        .await
        .unwrap();

    assert_eq!(arxiv.calls(), 0);
    assert_eq!(crossref.calls(), 1);
    assert_eq!(report.sources.keys().collect::<Vec<_>>(), vec!["crossref"]);
    assert_eq!(report.search_params.sources, vec!["crossref"]);
}

/// The JSON report carries the documented fields
#[tokio::test]
async fn test_report_json_shape() {
    let aggregator = aggregator(vec![
        MockSource::new(SourceType::Arxiv).with_papers(vec![paper_builder(
            SourceType::Arxiv,
            "2401.00001v1",
            "Shape test",
        )
        .doi("10.1/abc")
        .build()
        .unwrap()]),
        MockSource::new(SourceType::OpenAlex).failing("boom"),
    ]);

    let query = SearchRequest::new("shape")
        .sources(["arxiv", "openalex"])
        .max_results(3)
        .sort_by(SortBy::Date)
        .date_from("2020-01-01")
        .validate()
        .unwrap();
    let report = aggregator.search(&query).await;
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["query"], "shape");
    assert_eq!(value["total_results"], 1);
    assert_eq!(value["search_params"]["max_results"], 3);
    assert_eq!(value["search_params"]["date_from"], "2020-01-01");
    assert_eq!(value["search_params"]["sources"], json!(["arxiv", "openalex"]));

    let paper = &value["papers"][0];
    assert_eq!(paper["id"], "arxiv:2401.00001v1");
    assert_eq!(paper["abstract"], "Abstract of Shape test");
    assert_eq!(paper["doi"], "10.1/abc");
    assert_eq!(paper["published_date"], "2024-01-01T00:00:00");
    assert_eq!(paper["formatted_authors"], "Test Author");

    assert_eq!(value["sources"]["arxiv"]["count"], 1);
    assert!(value["sources"]["arxiv"].get("error").map_or(true, |e| e.is_null()));
    assert_eq!(value["sources"]["openalex"]["count"], 0);
    assert!(value["sources"]["openalex"]["error"]
        .as_str()
        .unwrap()
        .contains("boom"));
}

/// Test that the server can be created from a configured aggregator
#[tokio::test]
async fn test_server_initialization() {
    let aggregator = Aggregator::from_config(&Config::default()).unwrap();
    let server = McpServer::new(Arc::new(aggregator));
    assert!(server.is_ok());
}

/// Test source capabilities are properly reported
#[test]
fn test_source_capabilities() {
    let registry = SourceRegistry::new(&Config::default()).unwrap();
    assert_eq!(registry.len(), 3);

    let arxiv = registry.get(SourceType::Arxiv).unwrap();
    assert!(arxiv.capabilities().contains(SourceCapabilities::DATE_FILTER));
    assert!(!arxiv
        .capabilities()
        .contains(SourceCapabilities::SORT_BY_CITATIONS));

    let citation_sorted = registry.with_capability(SourceCapabilities::SORT_BY_CITATIONS);
    assert_eq!(citation_sorted.len(), 2);
}

/// Disabled sources are not registered and report as not configured
#[tokio::test]
async fn test_disabled_source_reported() {
    let mut config = Config::default();
    config.sources.disabled = vec!["arxiv".to_string(), "crossref".to_string()];
    let registry = SourceRegistry::new(&config).unwrap();
    assert!(!registry.has(SourceType::Arxiv));
    assert!(registry.has(SourceType::OpenAlex));

    let aggregator = Aggregator::new(registry);
    let report = aggregator
        .search_request(SearchRequest::new("q").sources(["arxiv"]))
        .await
        .unwrap();
    assert_eq!(
        report.source(SourceType::Arxiv).unwrap().error.as_deref(),
        Some("source is not configured")
    );
}

/// The MCP tools run the same pipeline
#[tokio::test]
async fn test_search_tool_end_to_end() {
    let aggregator = Arc::new(aggregator(vec![MockSource::new(SourceType::OpenAlex)
        .with_papers(vec![make_paper(SourceType::OpenAlex, "W9", "Via MCP")])]));
    let tools = ToolRegistry::new(aggregator);

    let result = tools
        .execute(
            "search_papers",
            json!({"query": "mcp", "sources": "openalex", "max_results": 2}),
        )
        .await
        .unwrap();
    assert_eq!(result["total_results"], 1);
    assert_eq!(result["papers"][0]["id"], "openalex:W9");

    assert!(tools
        .execute("search_papers", json!({"query": "mcp", "max_results": 0}))
        .await
        .is_err());
}

const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2024-01-10T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2401.11111v1</id>
    <updated>2024-01-02T00:00:00Z</updated>
    <published>2024-01-02T00:00:00Z</published>
    <title>Shared Result</title>
    <summary>Preprint version.</summary>
    <author><name>Ada Lovelace</name></author>
  </entry>
</feed>"#;

const OPENALEX_RESPONSE: &str = r#"{
    "meta": {"count": 2},
    "results": [
        {
            "id": "https://openalex.org/W100",
            "title": "Shared result",
            "doi": "https://doi.org/10.5555/shared",
            "publication_date": "2024-03-01",
            "abstract_inverted_index": {"Published": [0], "version.": [1]},
            "authorships": [{"author": {"display_name": "Ada Lovelace"}, "institutions": []}],
            "cited_by_count": 3
        },
        {
            "id": "https://openalex.org/W200",
            "title": "Only on OpenAlex",
            "publication_date": "2023-05-05",
            "abstract_inverted_index": {"Unique.": [0]},
            "authorships": [{"author": {"display_name": "Charles Babbage"}, "institutions": []}],
            "cited_by_count": 40
        }
    ]
}"#;

/// Real adapters against a local HTTP mock: one source down, duplicates merged
#[tokio::test]
async fn test_live_adapters_against_mock_http() {
    let mut server = mockito::Server::new_async().await;
    let arxiv = server
        .mock("GET", "/api/query")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(ARXIV_FEED)
        .create_async()
        .await;
    let openalex = server
        .mock("GET", "/oa/works")
        .match_query(Matcher::UrlEncoded("mailto".into(), "dev@example.org".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(OPENALEX_RESPONSE)
        .create_async()
        .await;
    let crossref = server
        .mock("GET", "/cr/works")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let mut config = Config::default();
    config.retry.max_attempts = 1;
    config.sources.mailto = Some("dev@example.org".to_string());
    config.sources.arxiv_url = Some(server.url());
    config.sources.openalex_url = Some(format!("{}/oa", server.url()));
    config.sources.crossref_url = Some(format!("{}/cr", server.url()));

    let aggregator = Aggregator::from_config(&config).unwrap();
    let report = aggregator
        .search_request(SearchRequest::new("shared result").sort_by(SortBy::CitationCount))
        .await
        .unwrap();

    arxiv.assert_async().await;
    openalex.assert_async().await;
    crossref.assert_async().await;

    // arXiv's copy wins the title collision; it has no citation count
    let ids: Vec<&str> = report.papers.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec!["openalex:W200", "arxiv:2401.11111v1"]);

    assert_eq!(report.source(SourceType::Arxiv).unwrap().count, 1);
    assert_eq!(report.source(SourceType::OpenAlex).unwrap().count, 2);
    let crossref_error = report.source(SourceType::CrossRef).unwrap().error.clone().unwrap();
    assert!(crossref_error.contains("500"), "got: {}", crossref_error);
}

/// Two selected sources, date sort: bounded, newest first, only selected keys
#[tokio::test]
async fn test_two_source_date_sorted_scenario() {
    let dated = |source: SourceType, id: &str, year: i32| {
        paper_builder(source, id, &format!("{} {}", source.id(), id))
            .published_date(
                chrono::NaiveDate::from_ymd_opt(year, 6, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            )
            .build()
            .unwrap()
    };
    let crossref = Arc::new(MockSource::new(SourceType::CrossRef));
    let mut registry = SourceRegistry::empty();
    registry.register(Arc::new(MockSource::new(SourceType::Arxiv).with_papers(
        (0..4).map(|i| dated(SourceType::Arxiv, &i.to_string(), 2015 + i)).collect(),
    )));
    registry.register(Arc::new(MockSource::new(SourceType::OpenAlex).with_papers(
        (0..4).map(|i| dated(SourceType::OpenAlex, &i.to_string(), 2017 + i)).collect(),
    )));
    registry.register(crossref.clone());
    let aggregator = Aggregator::new(registry);

    let report = aggregator
        .search_request(
            SearchRequest::new("graph neural networks")
                .max_results(5)
                .sources(["arxiv", "openalex"])
                .sort_by(SortBy::Date),
        )
        .await
        .unwrap();

    assert_eq!(report.papers.len(), 5);
    assert!(report
        .papers
        .windows(2)
        .all(|w| w[0].published_date() >= w[1].published_date()));
    assert_eq!(report.sources.keys().collect::<Vec<_>>(), vec!["arxiv", "openalex"]);
    assert_eq!(crossref.calls(), 0);
}
