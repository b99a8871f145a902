//! shonac - compile and run a Shona-language source file.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use inkwell::context::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shonac_drv::Driver;

/// shonac - JIT compiler for the Shona expression language
#[derive(Parser, Debug)]
#[command(name = "shonac")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiles and runs a Shona-language source file", long_about = None)]
struct Cli {
    /// Source file to compile and run
    file: PathBuf,

    /// Enable verbose (debug-level) tracing
    #[arg(short, long, env = "SHONAC_VERBOSE")]
    verbose: bool,

    /// Dump the module's IR before each top-level execution
    #[arg(long)]
    emit_ir: bool,
}

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => error.exit(),
            _ => {
                let _ = error.print();
                process::exit(1);
            }
        },
    };

    init_logging(cli.verbose)?;

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error: could not read {}: {}", cli.file.display(), error);
            process::exit(1);
        }
    };

    let context = Context::create();
    let mut driver = Driver::new(&context, cli.emit_ir)?;
    driver.run(&source)
}

/// Initializes tracing; `--verbose` forces debug level, otherwise
/// `RUST_LOG` applies with a quiet default.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}
