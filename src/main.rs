//! Cimple compiler CLI.
//!
//! Command-line interface for compiling `.ci` programs to RISC-V assembly.

use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::process;

use cimplec::{CompilerConfig, compile_file_with_config};

#[derive(ClapParser)]
#[command(name = "cimplec")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cimple compiler - compile .ci programs to RISC-V assembly", long_about = None)]
struct Cli {
    /// Input .ci source file
    input: PathBuf,

    /// Directory to write output files into (defaults to alongside the input)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Also write the intermediate .int quad listing
    #[arg(long)]
    keep_int: bool,

    /// Print the quad listing to stdout as it's generated
    #[arg(long)]
    print_quads: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut config = CompilerConfig::new()
        .with_emit_int(cli.keep_int)
        .with_print_quads(cli.print_quads);
    if let Some(out_dir) = cli.out_dir {
        config = config.with_out_dir(out_dir);
    }

    if let Err(message) = compile_file_with_config(&cli.input, &config) {
        eprintln!("cimplec: {message}");
        process::exit(1);
    }
}
