use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use hedwig::config::{load_config, Config, LogFormat};
use hedwig::mcp::McpServer;
use hedwig::models::{AggregationReport, SearchRequest, SortBy, SourceType};
use hedwig::sources::SourceRegistry;
use hedwig::ui::{self, Spinner};
use hedwig::Aggregator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Hedwig - search research papers across arXiv, OpenAlex and Crossref at once
#[derive(Parser, Debug)]
#[command(name = "hedwig")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search research papers across arXiv, OpenAlex and Crossref as one ranked, deduplicated list", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search all enabled sources and print the merged result
    #[command(alias = "s")]
    Search {
        /// Research topic or question
        query: String,

        /// Maximum number of papers to return (1-50)
        #[arg(long, short = 'n')]
        max_results: Option<usize>,

        /// Sort criterion: relevance, date or citations
        #[arg(long, default_value = "relevance")]
        sort_by: SortBy,

        /// Source to search; repeat or comma-separate for several (default: all)
        #[arg(long = "source", short = 's', value_delimiter = ',')]
        sources: Vec<String>,

        /// Only papers published on or after this date (YYYY-MM-DD)
        #[arg(long = "from")]
        date_from: Option<String>,

        /// Only papers published on or before this date (YYYY-MM-DD)
        #[arg(long = "to")]
        date_to: Option<String>,
    },

    /// List the known sources
    Sources {
        /// Show capabilities
        #[arg(long, short)]
        detailed: bool,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Run the MCP server
    Serve {
        /// Run in stdio mode (for MCP clients such as desktop assistants)
        #[arg(long, default_value_t = true)]
        stdio: bool,

        /// Run in streamable HTTP mode (overrides --stdio)
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hedwig={}", level)));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries results and the MCP stdio transport
    match config.logging.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&cli, &config);

    match &cli.command {
        Commands::Search {
            query,
            max_results,
            sort_by,
            sources,
            date_from,
            date_to,
        } => {
            let request = SearchRequest {
                query: query.clone(),
                max_results: max_results.unwrap_or(config.search.default_max_results),
                sort_by: *sort_by,
                sources: (!sources.is_empty()).then(|| sources.clone()),
                date_from: date_from.clone(),
                date_to: date_to.clone(),
            };
            let query = request.validate()?;
            let aggregator = Aggregator::from_config(&config)?;

            let spinner = Spinner::new(&format!(
                "Searching {} source(s) for \"{}\"...",
                query.enabled_sources().len(),
                query.query()
            ));
            let report = aggregator.search(&query).await;
            spinner.finish();

            if !cli.quiet {
                ui::print_source_status(&report);
            }
            output_report(&report, cli.output)?;
        }

        Commands::Sources { detailed } => {
            let registry = SourceRegistry::new(&config)?;
            if *detailed {
                ui::print_section("Sources");
            }
            for source_type in SourceType::ALL {
                let status = if registry.has(source_type) {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("{} - {} ({})", source_type.id(), source_type.name(), status);
                if *detailed {
                    if let Some(source) = registry.get(source_type) {
                        println!("  Capabilities: {}", source.capabilities().labels().join(", "));
                    }
                    if let Some(url) = config.sources.base_url(source_type) {
                        println!("  Base URL: {}", url);
                    }
                }
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }

        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "hedwig", &mut std::io::stdout());
        }

        Commands::Serve {
            stdio,
            http,
            port,
            host,
        } => {
            let aggregator = Arc::new(Aggregator::from_config(&config)?);
            let server = McpServer::new(aggregator)?;

            // --http wins over --stdio
            let use_http = *http || !*stdio;

            if use_http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!(%bound_addr, "MCP server listening");

                tokio::select! {
                    result = handle => {
                        result.map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down");
                    }
                }
            } else {
                server.run().await?;
            }
        }
    }

    Ok(())
}

fn output_report(report: &AggregationReport, format: OutputFormat) -> Result<()> {
    let actual_format = match format {
        OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    };

    match actual_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Plain => {
            for (i, paper) in report.papers.iter().enumerate() {
                println!("{}. {}", i + 1, paper.title());
                println!(
                    "   {} | {} | {}",
                    paper.formatted_authors(),
                    paper.source().name(),
                    paper.published_date().format("%Y-%m-%d")
                );
                println!("   URL: {}", paper.url());
                if let Some(doi) = paper.doi() {
                    println!("   DOI: {}", doi);
                }
                if let Some(citations) = paper.citation_count() {
                    println!("   Citations: {}", citations);
                }
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["#", "Title", "Authors", "Source", "Date", "Citations"]);

            for (i, paper) in report.papers.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i + 1),
                    Cell::new(ui::truncate_with_ellipsis(paper.title(), 60))
                        .add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(&paper.formatted_authors(), 30)),
                    Cell::new(paper.source().name()),
                    Cell::new(paper.published_date().format("%Y-%m-%d")),
                    Cell::new(
                        paper
                            .citation_count()
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ]);
            }
            println!("{table}");
            println!("{} of the merged results shown", report.total_results);
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}
