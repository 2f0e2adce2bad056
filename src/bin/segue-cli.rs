//! Segue CLI - drive sequence definitions from the command line
//!
//! Provides subcommands for listing and validating definitions and for
//! firing a command definition with seeded variables.

use clap::{Parser, Subcommand};
use segue::defs::{SequenceKind, loader};
use segue::engine::cache::InvocationCache;
use segue::{Engine, EngineConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "segue")]
#[command(about = "Embeddable action-sequence interpreter", long_about = None)]
struct Cli {
    /// Directory containing sequence definition files
    #[arg(short, long, default_value = "defs")]
    defs: PathBuf,

    /// Log every executed step
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded definitions
    List,

    /// List action names from the built-in pack
    Actions,

    /// Validate a single definition file
    Check {
        /// Definition file to parse
        file: PathBuf,
    },

    /// Run a command definition by name
    Run {
        /// Name of the command definition
        name: String,

        /// Entity owning per-entity variables for this run
        #[arg(long)]
        entity: Option<String>,

        /// Seed a transient variable (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,

        /// Give up waiting for completion after this many milliseconds
        #[arg(long, default_value = "30000")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = EngineConfig {
        defs_dir: cli.defs.clone(),
        debug: cli.debug,
    };

    match cli.command {
        Commands::List => {
            let engine = Engine::builder().config(config).build();
            let index = engine.load_defs()?;

            let mut commands = index.names(SequenceKind::Command);
            commands.sort();
            println!("Commands:");
            for name in commands {
                println!("  {}", name);
            }

            let mut events = index.names(SequenceKind::Event);
            events.sort();
            println!("Events:");
            for name in events {
                println!("  {}", name);
            }
        }

        Commands::Actions => {
            let engine = Engine::new();
            engine.install(segue::actions::units());
            let mut names = engine.registry().names();
            names.sort();
            for name in names {
                println!("  {}", name);
            }
        }

        Commands::Check { file } => {
            let defs = loader::load_file(&file)?;
            for def in defs {
                println!("{} '{}': {} steps", def.kind, def.name, def.len());
            }
        }

        Commands::Run {
            name,
            entity,
            vars,
            timeout,
        } => {
            let engine = Engine::builder()
                .config(config)
                .error_sink(
                    |diagnostic: &str, detail: &str, _cache: &InvocationCache| {
                        eprintln!("{}: {}", diagnostic, detail);
                    },
                )
                .build();
            engine.install(segue::actions::units());

            let index = engine.load_defs()?;
            let Some(def) = index.command(&name) else {
                anyhow::bail!("No command definition named '{}'", name);
            };

            let (tx, rx) = tokio::sync::oneshot::channel();
            let mut builder = InvocationCache::builder(def).on_complete(move || {
                let _ = tx.send(());
            });
            if let Some(entity) = entity {
                builder = builder.entity(entity);
            }
            for pair in vars {
                let Some((key, value)) = pair.split_once('=') else {
                    anyhow::bail!("--var expects KEY=VALUE, got '{}'", pair);
                };
                builder = builder.temp(key, value);
            }

            let cache = builder.build();
            engine.sequencer().start(&cache);

            match tokio::time::timeout(Duration::from_millis(timeout), rx).await {
                Ok(_) => println!("Run {} completed", cache.id()),
                Err(_) => println!(
                    "Run {} still pending after {}ms (suspended or stalled)",
                    cache.id(),
                    timeout
                ),
            }
        }
    }

    Ok(())
}
