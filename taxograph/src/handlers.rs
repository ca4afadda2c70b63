use anyhow::Context;
use chrono::Local;
use clap::ArgMatches;
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use taxograph_core::crawl::{CrawlOptions, CrawlStats, ThesaurusCrawler};
use taxograph_core::export::save_graph;
use taxograph_core::mirror::GraphMirror;
use taxograph_scraper::ThesaurusClient;
use tracing::debug;
use url::Url;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// Conventional exit code for a run stopped by Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush().unwrap();
    let mut response = String::new();
    io::stdin().read_line(&mut response).unwrap();
    response.trim().to_lowercase()
}

/// Expands a leading tilde in the configured output path.
pub fn expand_output_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Password for the mirror connection: the flag wins, then NEO4J_PASSWORD.
pub fn resolve_mirror_password(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| std::env::var("NEO4J_PASSWORD").ok())
}

async fn connect_mirror(uri: &str, user: &str, password: &str) -> anyhow::Result<GraphMirror> {
    let mirror = GraphMirror::connect(uri, user, password)
        .await
        .with_context(|| format!("failed to connect to Neo4j at {}", uri))?;
    mirror
        .verify_connectivity()
        .await
        .context("Neo4j connectivity check failed")?;
    Ok(mirror)
}

pub async fn handle_crawl(sub_matches: &ArgMatches) -> i32 {
    let verbose = sub_matches.get_flag("verbose");
    let no_progress = sub_matches.get_flag("no-progress");
    let output = sub_matches.get_one::<String>("output").unwrap();
    let concurrency = *sub_matches.get_one::<usize>("concurrency").unwrap();
    let max_iterations = *sub_matches.get_one::<usize>("max-iterations").unwrap();
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap();
    let base_url = sub_matches.get_one::<Url>("base-url").unwrap();
    let categories_url = sub_matches.get_one::<Url>("categories-url").unwrap();

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::ERROR
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let output_path = expand_output_path(output);
    debug!("Writing output to {}", output_path.display());

    let mirror = match sub_matches.get_one::<Url>("mirror") {
        Some(uri) => {
            let user = sub_matches.get_one::<String>("mirror-user").unwrap();
            let password = resolve_mirror_password(
                sub_matches
                    .get_one::<String>("mirror-password")
                    .map(String::as_str),
            );
            let Some(password) = password else {
                eprintln!(
                    "{} --mirror needs --mirror-password or the NEO4J_PASSWORD environment variable",
                    "✗".red().bold()
                );
                return EXIT_FAILURE;
            };
            match connect_mirror(uri.as_str(), user, &password).await {
                Ok(mirror) => Some(mirror),
                Err(e) => {
                    eprintln!("{} {:#}", "✗".red().bold(), e);
                    return EXIT_FAILURE;
                }
            }
        }
        None => None,
    };
    let mirror_enabled = mirror.is_some();

    print_divider();
    println!("{}", "  TAXOGRAPH CRAWL".bright_white().bold());
    print_divider();
    println!("{} Concept endpoint: {}", "→".blue(), base_url);
    println!("{} Concurrency: {}", "→".blue(), concurrency);
    println!("{} Max fixpoint iterations: {}", "→".blue(), max_iterations);
    println!("{} Output: {}", "→".blue(), output_path.display());
    if mirror_enabled {
        println!("{} Mirroring to Neo4j", "→".blue());
    }
    println!();

    let client = ThesaurusClient::with_timeout(timeout)
        .with_base_url(base_url.as_str())
        .with_categories_url(categories_url.as_str())
        .with_concurrency(concurrency);
    let options = CrawlOptions {
        max_iterations,
        show_progress: !no_progress && !verbose,
    };
    let mut crawler = ThesaurusCrawler::new(client, options);
    if let Some(mirror) = mirror {
        crawler = crawler.with_mirror(mirror);
    }

    let started = Instant::now();
    let outcome = tokio::select! {
        result = crawler.crawl(None) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(stats)) => {
            let graph_json = crawler.graph().to_json();
            if let Err(e) = save_graph(&graph_json, &output_path) {
                eprintln!(
                    "{} Failed to write {}: {}",
                    "✗".red().bold(),
                    output_path.display(),
                    e
                );
                return EXIT_FAILURE;
            }
            print_summary(
                &stats,
                &output_path,
                started.elapsed().as_secs_f64(),
                mirror_enabled,
            );
            EXIT_SUCCESS
        }
        Some(Err(e)) => {
            eprintln!("\n{} Crawl failed: {}", "✗".red().bold(), e);
            offer_mirror_clear(crawler.mirror()).await;
            EXIT_FAILURE
        }
        None => {
            println!("\n{} Crawl interrupted", "✗".red().bold());
            offer_mirror_clear(crawler.mirror()).await;
            EXIT_INTERRUPTED
        }
    }
}

fn print_summary(stats: &CrawlStats, output: &Path, elapsed_secs: f64, mirrored: bool) {
    println!();
    print_divider();
    println!("{}", "  CRAWL COMPLETE".green().bold());
    print_divider();
    println!(
        "{} Meta topics: {}",
        "✓".green().bold(),
        stats.meta_topics.to_string().cyan()
    );
    println!(
        "{} Topics: {}",
        "✓".green().bold(),
        stats.topics.to_string().cyan()
    );
    println!(
        "{} Subtopics: {}",
        "✓".green().bold(),
        stats.subtopics.to_string().cyan()
    );
    println!(
        "{} Graph: {} nodes, {} edges",
        "✓".green().bold(),
        stats.nodes.to_string().cyan(),
        stats.edges.to_string().cyan()
    );
    println!(
        "{} Fixpoint iterations: {}",
        "✓".green().bold(),
        stats.fixpoint_iterations.to_string().cyan()
    );
    if stats.failed_fetches > 0 {
        println!(
            "{} Unreachable documents: {}",
            "⚠".yellow().bold(),
            stats.failed_fetches.to_string().yellow()
        );
    }
    if mirrored {
        println!("{} Mirrored to Neo4j", "✓".green().bold());
    }
    println!(
        "{} Output: {}",
        "✓".green().bold(),
        output.display().to_string().bright_white()
    );
    println!(
        "{} Finished: {} ({:.1}s)",
        "✓".green().bold(),
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        elapsed_secs
    );
}

/// After an early end, lets the operator drop whatever made it into the
/// mirror instead of leaving a partial graph behind.
async fn offer_mirror_clear(mirror: Option<&GraphMirror>) {
    let Some(mirror) = mirror else {
        return;
    };
    let response = print_prompt("Clear the partially mirrored data from Neo4j? [y/N]:");
    if response == "y" || response == "yes" {
        match mirror.clear_all().await {
            Ok(()) => println!("{} Mirror cleared", "✓".green().bold()),
            Err(e) => eprintln!(
                "{} Failed to clear the mirror: {}",
                "✗".red().bold(),
                e
            ),
        }
    } else {
        println!("Keeping the partially mirrored data.");
    }
}
