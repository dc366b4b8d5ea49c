//! `miaoma` launcher CLI.
//!
//! Finds the project root (the nearest ancestor with `miaoma.py`, `src/` and
//! `assets/`), reads `tools/project.ini`, and drives `python3 miaoma.py`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use launcher::core::command::{DEFAULT_TABLE, DumpFormat, DumpOptions};
use launcher::dump::run_dump;
use launcher::exit_codes;
use launcher::generate::{GenRequest, run_gen};
use launcher::io::process::ProcessRunner;
use launcher::io::root::locate_project_root;
use launcher::logging;

#[derive(Parser)]
#[command(
    name = "miaoma",
    version,
    about = "Configuration-driven launcher for the miaoma code generator"
)]
struct Cli {
    /// Directory to start the project root search from (default: current directory).
    #[arg(long, global = true, value_name = "DIR")]
    start_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate code (TOOL_MODE=1: gen-code, TOOL_MODE=2: gen-project).
    Gen {
        /// Output directory; relative paths resolve against the project root.
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,
    },
    /// Dump table metadata.
    Dump(DumpArgs),
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Table name.
    #[arg(short = 'n', long, default_value = DEFAULT_TABLE)]
    table: String,

    /// Output format.
    #[arg(long, value_enum)]
    format: Option<DumpFormat>,

    /// Only show fields starting with this prefix.
    #[arg(long, visible_alias = "prefix", value_name = "STRING")]
    filter_prefix: Option<String>,

    /// Only show fields whose key contains this string.
    #[arg(long, visible_alias = "include", value_name = "STRING")]
    filter_include: Option<String>,

    /// Hide fields whose key contains this string.
    #[arg(long, visible_alias = "exclude", value_name = "STRING")]
    filter_exclude: Option<String>,

    /// Skip derived configuration.
    #[arg(long)]
    no_derived: bool,

    /// Verbose tool output and debug logging.
    #[arg(long)]
    verbose: bool,
}

impl From<DumpArgs> for DumpOptions {
    fn from(args: DumpArgs) -> Self {
        Self {
            table: Some(args.table),
            format: args.format,
            filter_prefix: args.filter_prefix,
            filter_include: args.filter_include,
            filter_exclude: args.filter_exclude,
            no_derived: args.no_derived,
            verbose: args.verbose,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = match &cli.command {
        Command::Dump(args) if args.verbose => "debug",
        _ => "info",
    };
    logging::init(level);

    if let Err(err) = run(cli) {
        tracing::error!("{:#}", err);
        std::process::exit(exit_codes::FAILURE);
    }
}

fn run(cli: Cli) -> Result<()> {
    let start = match cli.start_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("read current directory")?,
    };
    let root = locate_project_root(&start)?;
    let runner = ProcessRunner;

    match cli.command {
        Command::Gen { output } => {
            info!("=== miaoma code generation ===");
            run_gen(&root, &GenRequest { output }, &runner)?;
        }
        Command::Dump(args) => {
            info!("=== miaoma table dump ===");
            let stdout = std::io::stdout();
            run_dump(&root, &args.into(), &runner, &mut stdout.lock())?;
        }
    }

    info!("all done");
    Ok(())
}
