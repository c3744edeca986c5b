use std::path::PathBuf;
use std::process;

use clap::Parser;

use jackc::cli::common::{default_output_path, exit_with_error, read_source_or_exit, write_output_or_exit};
use jackc::diagnostic::print_diagnostics;

/// Assembles a single .asm file down to 16-bit Hack binary.
#[derive(Parser)]
#[command(name = "hackasm", version, about = "Hack assembler")]
struct Cli {
    /// Input .asm file
    input: PathBuf,
    /// Output .hack file (default: <input>.hack)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    if !cli.input.extension().is_some_and(|e| e == "asm") {
        exit_with_error("input must be a .asm file");
    }

    let source = read_source_or_exit(&cli.input);
    let words = match jackc::assemble(&source) {
        Ok(words) => words,
        Err(diags) => {
            print_diagnostics(&diags);
            process::exit(1);
        }
    };

    let out_path = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.input, "hack"));
    let mut contents = words.join("\n");
    contents.push('\n');
    write_output_or_exit(&out_path, &contents);
    eprintln!("Assembled -> {}", out_path.display());
}
