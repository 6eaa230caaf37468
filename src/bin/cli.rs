//! CLI binary for khoji.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use khoji::{KhojiConfig, Locale, Services, Translator};
use khoji_search::{format_domain_fields, CandidateDocument, ExtractedPage, Summary};

/// Khoji: ask a question, get a summarised answer with ranked sources.
#[derive(Parser)]
#[command(name = "khoji", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Language of the query and the answer.
    #[arg(short, long, value_enum, default_value_t = Locale::En)]
    lang: Locale,

    /// Fetch every result page and re-rank on its content.
    #[arg(long)]
    deep: bool,

    /// Number of documents to retrieve (defaults to the config value).
    #[arg(short = 'n', long)]
    max_results: Option<usize>,

    /// The question to answer.
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    khoji::init_tracing();

    let cli = Cli::parse();
    let config = KhojiConfig::load(cli.config.as_deref())?;
    let services = Services::from_config(&config)?;
    let translator = Translator::new(&services.model);

    let mut query = cli.query.join(" ");
    if cli.lang == Locale::Ne {
        query = translator.from_nepali(&query).await;
    }

    let max_results = cli
        .max_results
        .unwrap_or_else(|| services.pipeline.retrieval().default_max_results());

    let (summary, pages) = if cli.deep {
        let deep = services.pipeline.answer_deep(&query, max_results).await;
        (deep.summary, deep.pages)
    } else {
        (services.pipeline.answer(&query, max_results).await, Vec::new())
    };

    if summary.results.is_empty() {
        println!("{}", cli.lang.no_results());
        return Ok(());
    }
    eprintln!("{} {}", summary.results.all_docs.len(), cli.lang.results_found());

    let summary = match cli.lang {
        Locale::Ne => translator.localise_summary(summary).await,
        Locale::En => summary,
    };

    print_summary(&summary, cli.lang);
    print_pages(&pages);
    Ok(())
}

fn print_summary(summary: &Summary, lang: Locale) {
    println!("{}\n", summary.summary);

    let high = &summary.results.high_relevance_docs;
    if !high.is_empty() {
        println!("## {}\n", lang.high_relevance_heading());
        for doc in high {
            print_document(doc);
        }
    }

    let high_urls: HashSet<&str> = high.iter().map(|d| d.url.as_str()).collect();
    let others: Vec<&CandidateDocument> = summary
        .results
        .all_docs
        .iter()
        .filter(|d| !high_urls.contains(d.url.as_str()))
        .collect();
    if !others.is_empty() {
        println!("## {}\n", lang.other_results_heading());
        for doc in others {
            print_document(doc);
        }
    }
}

fn print_document(doc: &CandidateDocument) {
    println!("- {} ({:.1}%)", doc.title, doc.relevance() * 100.0);
    println!("  {}", doc.url);
    println!("  {}\n", doc.snippet);
}

fn print_pages(pages: &[ExtractedPage]) {
    for page in pages.iter().filter(|p| !p.domain_fields.is_empty()) {
        println!("## {} ({})\n", page.domain, page.timestamp);
        println!("{}\n", format_domain_fields(&page.domain_fields));
    }
}
