use crate::CLAP_STYLING;
use clap::{arg, command};
use taxograph_scraper::{DEFAULT_BASE_URL, DEFAULT_CATEGORIES_URL};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("taxograph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("taxograph")
        .styles(CLAP_STYLING)
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl the UNBIS Thesaurus into a typed topic graph and export it as JSON. \
                    Optionally mirror the graph into Neo4j.",
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to write the exported graph JSON")
                        .default_value("downloads/output.json"),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM_FETCHES>)
                        .required(false)
                        .help("The maximum number of in-flight concept fetches")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"max-iterations" <NUM>)
                        .required(false)
                        .help("Upper bound on subtopic fixpoint iterations before giving up")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"base-url" <URL>)
                        .required(false)
                        .help("Root URL of the concept endpoint")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(DEFAULT_BASE_URL),
                )
                .arg(
                    arg!(--"categories-url" <URL>)
                        .required(false)
                        .help("URL of the HTML category listing page")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(DEFAULT_CATEGORIES_URL),
                )
                .arg(
                    arg!(-v --"verbose")
                        .required(false)
                        .help("Stream debug-level progress logs instead of the spinner")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Suppress the progress spinner")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"mirror" <BOLT_URI>)
                        .required(false)
                        .help("Mirror the graph into the Neo4j instance at this bolt URI")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"mirror-user" <USER>)
                        .required(false)
                        .help("Neo4j user for the mirror connection")
                        .default_value("neo4j"),
                )
                .arg(
                    arg!(--"mirror-password" <PASSWORD>)
                        .required(false)
                        .help("Neo4j password (falls back to NEO4J_PASSWORD)"),
                ),
        )
}
