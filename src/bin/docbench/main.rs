mod app;
mod commands;
mod context;

use anyhow::Result;
use log::info;

fn main() -> Result<()> {
    // Le niveau de log dépend de --verbose, le logger est initialisé dans app::run
    let result = app::run();

    info!("Fin de docbench");

    result
}
