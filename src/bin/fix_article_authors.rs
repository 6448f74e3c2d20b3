/*!
 * CLI tool to point every article at the admin user
 *
 * Articles whose `authorId` no longer matches a user crash the article pages.
 * This rewrites `authorId` on the whole collection to the id of the user
 * named `admin` (or `--username`).
 *
 * Usage: cargo run --bin fix_article_authors
 */

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use tracing::info;

use gravy_tools::{
    config::Config,
    logging,
    maintenance::fix_article_authors,
    reference::{UserLookup, DEFAULT_ADMIN_USERNAME},
    with_database,
};

fn cli() -> Command {
    Command::new("fix_article_authors")
        .about("Reassign every article to the admin user")
        .arg(
            Arg::new("username")
                .help("Username of the user that becomes the author")
                .long("username")
                .short('u')
                .value_name("NAME"),
        )
}

fn author_lookup(matches: &ArgMatches) -> UserLookup {
    match matches.get_one::<String>("username") {
        Some(name) => UserLookup::username(name.as_str()),
        None => UserLookup::username(DEFAULT_ADMIN_USERNAME),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let matches = cli().get_matches();
    let lookup = author_lookup(&matches);

    let config = Config::from_env()?;

    let report = with_database(&config, |db| async move {
        info!("🔍 Looking for {}...", lookup);
        fix_article_authors(&db, &lookup)
            .await
            .context("❌ Failed to fix article authors")
    })
    .await?;

    if report.already_consistent() {
        println!(
            "🎉 Success! Fixed 0 articles ({} matched, all already use author {}).",
            report.outcome.matched, report.author_id
        );
    } else {
        println!("🎉 Success! Fixed {} articles.", report.outcome.modified);
    }
    println!("🚀 You can now restart your backend server.");

    Ok(())
}
