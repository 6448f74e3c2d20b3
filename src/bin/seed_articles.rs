/*!
 * CLI tool to seed the articles collection with fixture data
 *
 * Every run appends a new batch; it is not idempotent.
 *
 * Usage: cargo run --bin seed_articles -- [--count N] [--seed S]
 */

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{value_parser, Arg, ArgMatches, Command};

use gravy_tools::{
    config::Config,
    logging, rng_from_seed,
    seed::{seed_articles, DEFAULT_ARTICLE_COUNT},
    with_database,
};

fn cli() -> Command {
    Command::new("seed_articles")
        .about("Insert a batch of generated articles")
        .arg(
            Arg::new("count")
                .help("Number of articles to generate")
                .long("count")
                .short('n')
                .value_name("N")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .help("Seed for reproducible fixtures")
                .long("seed")
                .value_name("SEED")
                .value_parser(value_parser!(u64)),
        )
}

fn article_count(matches: &ArgMatches) -> usize {
    matches
        .get_one::<usize>("count")
        .copied()
        .unwrap_or(DEFAULT_ARTICLE_COUNT)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let matches = cli().get_matches();

    let count = article_count(&matches);
    let mut rng = rng_from_seed(matches.get_one::<u64>("seed").copied());

    let config = Config::from_env()?;

    let report = with_database(&config, |db| async move {
        seed_articles(&db, count, Utc::now(), &mut rng)
            .await
            .context("Failed to insert")
    })
    .await?;

    println!(
        "✅ Successfully seeded {} articles into the database!",
        report.inserted
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_defaults_to_library_constant() {
        let matches = cli().try_get_matches_from(["seed_articles"]).unwrap();
        assert_eq!(article_count(&matches), DEFAULT_ARTICLE_COUNT);
        assert!(matches.get_one::<u64>("seed").is_none());
    }

    #[test]
    fn test_count_and_seed_flags() {
        let matches = cli()
            .try_get_matches_from(["seed_articles", "-n", "7", "--seed", "42"])
            .unwrap();
        assert_eq!(article_count(&matches), 7);
        assert_eq!(matches.get_one::<u64>("seed").copied(), Some(42));

        assert!(cli().try_get_matches_from(["seed_articles", "--count", "many"]).is_err());
    }
}
