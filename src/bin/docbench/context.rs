use std::future::Future;

use anyhow::{anyhow, Result};
use tokio::runtime::Runtime;

use docbench::{BenchConfig, Palette};

/// Contexte d'exécution du CLI
pub struct Context {
    /// Configuration de la démonstration
    config: BenchConfig,

    /// Palette de couleurs de la sortie console
    palette: Palette,

    /// Runtime Tokio pour les appels asynchrones
    runtime: Runtime,
}

impl Context {
    /// Crée un nouveau contexte
    pub fn new(config: BenchConfig, no_color: bool) -> Result<Self> {
        let palette = if no_color {
            Palette::without_colors()
        } else {
            Palette::new()
        };

        // Un seul thread: les phases s'enchaînent strictement
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| anyhow!("Failed to create Tokio runtime: {}", e))?;

        Ok(Context {
            config,
            palette,
            runtime,
        })
    }

    /// Obtient la configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Obtient la palette
    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Exécute une future jusqu'à son terme
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
