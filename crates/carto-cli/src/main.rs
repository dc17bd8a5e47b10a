use anyhow::{Context, Result};
use carto_config::CartoConfig;
use carto_symbol_index::CrossTileSymbolIndex;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

mod replay;

#[derive(Parser)]
#[command(name = "carto", version, about = "Carto CLI (cross-tile symbol index tooling)")]
struct Cli {
    /// Path to a `carto.toml` config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a JSON script of tile updates through the symbol index
    Replay(ReplayArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
struct ReplayArgs {
    /// Path to the replay script
    script: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConfigArgs {
    /// Emit JSON instead of TOML-like text
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => CartoConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CartoConfig::default(),
    };
    carto_config::init_tracing(&config.logging);

    match cli.command {
        Command::Replay(args) => {
            let script = replay::ReplayScript::load(&args.script)?;
            let mut index = CrossTileSymbolIndex::with_grid(config.symbol_index.grid()?);
            let report = replay::run(&script, &mut index)?;
            if args.json {
                print_json(&report)?;
            } else {
                print!("{}", replay::render_text(&report));
            }
            Ok(0)
        }
        Command::Config(args) => {
            if args.json {
                print_json(&config)?;
            } else {
                let grid = config.symbol_index.grid()?;
                println!("symbol_index:");
                println!("  extent: {}", config.symbol_index.extent);
                println!("  tile_size: {}", config.symbol_index.tile_size);
                println!("  cell_size_px: {}", config.symbol_index.cell_size_px);
                println!("  cell_units: {}", grid.cell_units());
                println!("logging:");
                println!("  level: {}", config.logging.level);
                println!("  json: {}", config.logging.json);
                println!("  stderr: {}", config.logging.stderr);
            }
            Ok(0)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
