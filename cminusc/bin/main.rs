use std::path::PathBuf;

use clap::Parser;

use cminusc::cli;
use cminusc::logger;

#[derive(Parser, Debug)]
#[command(name = "cminusc", about = "C-minus compiler")]
struct Args {
    /// Turn on verbose logging. Repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log messages to this file rather than standard error.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand, Debug)]
enum Action {
    /// Compiles a source file to x86-64 assembly.
    Compile {
        file: PathBuf,

        /// Output file. Writes to standard output when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Checks source files for errors without generating code.
    Check { files: Vec<PathBuf> },
    /// Prints the tokens of a source file, one per line.
    Tokenize { file: PathBuf },
}

pub fn main() -> Result<(), String> {
    let args = Args::parse();

    logger::configure(args.verbose, args.log_file)?;

    match args.action {
        Action::Compile { file, output } => cli::compile(&file, output.as_deref(), false),
        Action::Check { files } => cli::check(files, false),
        Action::Tokenize { file } => cli::tokenize(&file, false),
    }
}
