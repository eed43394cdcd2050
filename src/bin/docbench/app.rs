use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::info;

use docbench::config::{DEFAULT_DATABASE, DEFAULT_SLOW_LIMIT, DEFAULT_SLOW_MS, DEFAULT_URI};
use docbench::{BenchConfig, SeedConfig};

use crate::commands;
use crate::context::Context;

#[derive(Parser)]
#[command(name = "docbench")]
#[command(about = "Slow vs indexed query demonstration for MongoDB", long_about = None)]
struct Cli {
    /// Niveau de verbosité (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Chaîne de connexion du serveur
    #[arg(long, env = "MONGODB_URI", default_value = DEFAULT_URI, global = true)]
    uri: String,

    /// Base de données contenant le jeu de démonstration
    #[arg(short, long, default_value = DEFAULT_DATABASE, global = true)]
    database: String,

    /// Désactive les couleurs
    #[arg(long, global = true)]
    no_color: bool,

    /// Commande à exécuter (run par défaut)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Exécute la démonstration complète
    Run(RunArgs),

    /// Remplace les collections par un jeu de données déterministe
    Seed(SeedArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Seuil de profilage des requêtes lentes, en millisecondes
    #[arg(long, default_value_t = DEFAULT_SLOW_MS)]
    slow_ms: i64,

    /// Nombre de requêtes lentes affichées
    #[arg(long, default_value_t = DEFAULT_SLOW_LIMIT)]
    limit: usize,

    /// N'attend pas entre les phases
    #[arg(long)]
    no_pause: bool,
}

#[derive(Args)]
struct SeedArgs {
    /// Nombre d'utilisateurs
    #[arg(long, default_value_t = 10_000)]
    users: usize,

    /// Nombre de livres
    #[arg(long, default_value_t = 20_000)]
    books: usize,

    /// Nombre d'éditeurs
    #[arg(long, default_value_t = 250)]
    publishers: usize,

    /// Graine du générateur
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Documents par insertion
    #[arg(long, default_value_t = 1_000)]
    batch_size: usize,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Exécute l'application CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.verbose);
    info!("Démarrage de docbench");

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = BenchConfig {
        uri: cli.uri,
        database: cli.database,
        ..BenchConfig::default()
    };

    match cli.command {
        Some(Commands::Seed(args)) => {
            let context = Context::new(config, cli.no_color)?;
            let seed = SeedConfig {
                users: args.users,
                books: args.books,
                publishers: args.publishers,
                seed: args.seed,
                batch_size: args.batch_size,
            };
            commands::seed::execute(&context, &seed)
        }
        command => {
            let args = match command {
                Some(Commands::Run(args)) => args,
                _ => RunArgs {
                    slow_ms: DEFAULT_SLOW_MS,
                    limit: DEFAULT_SLOW_LIMIT,
                    no_pause: false,
                },
            };
            let config = BenchConfig {
                slow_ms: args.slow_ms,
                slow_limit: args.limit,
                pause: !args.no_pause,
                ..config
            };
            let context = Context::new(config, cli.no_color)?;
            commands::run::execute(&context)
        }
    }
}
