use anyhow::{Context as _, Result};
use log::info;

use docbench::{BenchmarkRunner, NoPause, Pacer, PromptPacer};

use crate::context::Context;

/// Exécute la démonstration complète
pub fn execute(context: &Context) -> Result<()> {
    let palette = context.palette();
    let config = context.config().clone();

    println!("{}", palette.bold("MongoDB schema performance demo"));
    println!("{}", palette.subdue(&format!("{} / {}", config.uri, config.database)));
    println!();

    let mut pacer: Box<dyn Pacer> = if config.pause {
        Box::new(PromptPacer::new(palette).context("Impossible de créer l'invite")?)
    } else {
        Box::new(NoPause)
    };

    let summary = context.block_on(async {
        let runner = BenchmarkRunner::connect(config, palette).await?;
        runner.run(pacer.as_mut()).await
    })?;

    info!(
        "Terminé: {} -> {} ms sur {} livres",
        summary.without_indexes.total_millis(),
        summary.with_indexes.total_millis(),
        summary.dataset.books
    );
    println!();

    Ok(())
}
