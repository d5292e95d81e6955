//! CLI binary for retrieval-services.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use retrieval_services::providers::{
    DblpApi, DblpBibType, DblpEntityType, GoogleApi, LoaderOptions, PineconeApi,
    RetrieverOptions, SemanticScholarApi,
};
use retrieval_services::{PageSearch, Retriever, ServicesConfig, Table};
use tracing_subscriber::EnvFilter;

/// Query remote search services and print results as JSON lines.
#[derive(Parser)]
#[command(name = "retrieval", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hide progress bars.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run one or more queries against a search provider.
    Search {
        /// Provider to query.
        #[arg(short, long, value_enum, default_value_t = Provider::Dblp)]
        provider: Provider,

        /// Results to fetch per query.
        #[arg(short, long, default_value_t = 100)]
        num_results: usize,

        /// DBLP index to search (publication, author, venue).
        #[arg(long, default_value_t = DblpEntityType::Publication)]
        entity_type: DblpEntityType,

        /// Pinecone index host (required for `--provider pinecone`).
        #[arg(long)]
        index_host: Option<String>,

        /// Pinecone namespace.
        #[arg(long, default_value = "__default__")]
        namespace: String,

        /// Query strings; each gets qid 1, 2, 3...
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Download BibTeX records for DBLP keys.
    Bibtex {
        /// BibTeX flavour (standard, condensed, with_crossref).
        #[arg(long, default_value_t = DblpBibType::Standard)]
        bib_type: DblpBibType,

        /// DBLP keys, e.g. conf/cikm/MacdonaldTMO21.
        #[arg(required = true)]
        docnos: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Provider {
    Dblp,
    SemanticScholar,
    Google,
    Pinecone,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("retrieval_services=info,retrieval_core=info")
        }))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServicesConfig::from_file(path)?,
        None => ServicesConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;
    let retry = config.retry.policy()?;

    match cli.command {
        Command::Search {
            provider,
            num_results,
            entity_type,
            index_host,
            namespace,
            queries,
        } => {
            let options = RetrieverOptions::new(num_results)
                .with_retry(retry)
                .with_verbose(!cli.quiet);
            let queries = Table::from_queries(
                queries
                    .into_iter()
                    .enumerate()
                    .map(|(i, query)| ((i + 1).to_string(), query)),
            );
            match provider {
                Provider::Dblp => {
                    let api = DblpApi::with_config(config.dblp, &config.http)?;
                    run_search(api.retriever(entity_type, options), &queries).await
                }
                Provider::SemanticScholar => {
                    let api = SemanticScholarApi::with_config(config.semantic_scholar, &config.http)?;
                    run_search(api.retriever(options), &queries).await
                }
                Provider::Google => {
                    let api = GoogleApi::with_config(config.google, &config.http)?;
                    run_search(api.retriever(options), &queries).await
                }
                Provider::Pinecone => {
                    let Some(host) = index_host else {
                        anyhow::bail!("--index-host is required for the pinecone provider");
                    };
                    let api = PineconeApi::with_config(config.pinecone, &config.http)?;
                    run_search(api.index(host, namespace).retriever(options), &queries).await
                }
            }
        }
        Command::Bibtex { bib_type, docnos } => {
            let options = LoaderOptions::default()
                .with_retry(retry)
                .with_verbose(!cli.quiet);
            let loader = DblpApi::with_config(config.dblp, &config.http)?.bibtex_loader(bib_type, options);
            let mut input = Table::with_columns(["docno"]);
            for docno in docnos {
                input.push_row(vec![docno.into()])?;
            }
            print_rows(&loader.transform(&input).await?)
        }
    }
}

async fn run_search<S: PageSearch>(retriever: Retriever<S>, queries: &Table) -> anyhow::Result<()> {
    let results = retriever.transform(queries).await?;
    tracing::info!(rows = results.len(), "search complete");
    print_rows(&results)
}

fn print_rows(table: &Table) -> anyhow::Result<()> {
    for row in table.rows() {
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}
