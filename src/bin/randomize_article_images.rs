/*!
 * CLI tool to replace article thumbnails with images from a fixed pool
 *
 * Articles are updated one at a time; a document that cannot be decoded or
 * updated is logged and skipped.
 *
 * Usage: cargo run --bin randomize_article_images -- [--seed S]
 */

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};

use gravy_tools::{
    config::Config,
    logging,
    maintenance::{randomize_thumbnails, IMAGE_POOL},
    rng_from_seed, with_database,
};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let matches = Command::new("randomize_article_images")
        .about("Assign a random thumbnail to every article")
        .arg(
            Arg::new("seed")
                .help("Seed for a reproducible assignment")
                .long("seed")
                .value_name("SEED")
                .value_parser(value_parser!(u64)),
        )
        .get_matches();

    let mut rng = rng_from_seed(matches.get_one::<u64>("seed").copied());

    let config = Config::from_env()?;

    let report = with_database(&config, |db| async move {
        randomize_thumbnails(&db, IMAGE_POOL, &mut rng)
            .await
            .context("Failed to fetch articles")
    })
    .await?;

    if report.skipped > 0 {
        println!(
            "⚠️  Skipped {} of {} articles, see the log for details",
            report.skipped, report.scanned
        );
    }
    println!(
        "✅ Successfully updated {} articles with new images!",
        report.updated
    );

    Ok(())
}
