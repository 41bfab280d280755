//! Digivolve CLI
//!
//! Command-line front end for the evolution dataset:
//! - `lookup`: print the evolution line of one Digimon
//! - `check`: load a table and report what the loader found
//! - `repl`: interactive lookups against a loaded table
//! - `serve`: HTTP API over a loaded table

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use digivolve_ingest_table::{load_graph_from_path, LoadReport, LoadedGraph};
use digivolve_query::{EvolutionService, LineageOptions};

mod logging;
mod render;
mod repl;
mod server;

const DEFAULT_DATA: &str = "data/digimon_list.csv";

#[derive(Parser)]
#[command(name = "digivolve")]
#[command(author, version, about = "Digivolve: Digimon evolution-line lookup")]
struct Cli {
    /// More log output on stderr (`-v` info, `-vv` debug, `-vvv` trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Source table (`.csv` or a `.json` array of row objects).
    #[arg(long, env = "DIGIVOLVE_DATA", default_value = DEFAULT_DATA)]
    data: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a Digimon evolves from and into
    Lookup {
        /// Digimon name (case and extra whitespace are ignored)
        name: String,

        #[command(flatten)]
        data: DataArgs,

        /// Maximum number of hops in each direction (default: unbounded).
        #[arg(long)]
        depth: Option<usize>,

        /// Print the JSON response instead of the human-readable view.
        #[arg(long)]
        json: bool,
    },

    /// Load a table and print the load report
    Check {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Interactive lookups (empty line, `exit`, `quit` or `salir` to leave)
    Repl {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Listen address. Defaults to `0.0.0.0:$PORT`, port 8000 when `PORT` is unset.
    ///
    /// Use `127.0.0.1:0` to auto-pick a free port.
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// If set, write a small JSON file (`addr`, `pid`) once the server is listening.
    #[arg(long)]
    ready_file: Option<PathBuf>,
}

/// Load a table and wrap the frozen graph in a query service.
fn load_service(path: &Path) -> Result<(EvolutionService, LoadReport)> {
    let LoadedGraph { graph, report } =
        load_graph_from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
    Ok((EvolutionService::new(Arc::new(graph)), report))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve(_) => LevelFilter::INFO,
        _ => LevelFilter::WARN,
    };
    logging::init(cli.verbose, default_level);

    match cli.command {
        Commands::Lookup {
            name,
            data,
            depth,
            json,
        } => cmd_lookup(&name, &data.data, depth, json)?,
        Commands::Check { data } => cmd_check(&data.data)?,
        Commands::Repl { data } => {
            let (service, _report) = load_service(&data.data)?;
            repl::cmd_repl(&service)?;
        }
        Commands::Serve(args) => server::cmd_serve(args)?,
    }

    Ok(())
}

fn cmd_lookup(name: &str, data: &Path, depth: Option<usize>, json: bool) -> Result<()> {
    let (service, _report) = load_service(data)?;
    let response = service.get_evolution_line_with(name, LineageOptions::with_max_depth(depth));
    if json {
        println!("{}", response.to_json());
    } else {
        render::print_response(&response);
    }
    Ok(())
}

fn cmd_check(data: &Path) -> Result<()> {
    let (service, report) = load_service(data)?;
    render::print_report(data, &report, service.graph());
    Ok(())
}
