use anyhow::Result;
use mongodb::Client;

use docbench::console::{group_thousands, print_flush};
use docbench::seed::{self, Dataset};
use docbench::SeedConfig;

use crate::context::Context;

/// Remplace les collections de travail par le jeu de démonstration
pub fn execute(context: &Context, seed_config: &SeedConfig) -> Result<()> {
    let palette = context.palette();
    let config = context.config();

    print_flush(&palette.bold("Generating dataset ... "))?;
    let dataset = Dataset::generate(seed_config);
    println!("{}", palette.subdue("done."));

    print_flush(&palette.bold(&format!("Loading into {} ... ", config.database)))?;
    let summary = context.block_on(async {
        let client = Client::with_uri_str(&config.uri).await?;
        let db = client.database(&config.database);
        seed::load(&db, &dataset, seed_config.batch_size).await
    })?;
    println!("{}", palette.subdue("done."));

    for (count, what) in [
        (summary.users, " users"),
        (summary.publishers, " publishers"),
        (summary.books, " books"),
        (summary.reviews, " reviews"),
    ] {
        println!("{}{}", palette.highlight(&group_thousands(count as u64)), palette.subdue(what));
    }

    Ok(())
}
