use std::path::PathBuf;
use std::process;

use clap::Parser;

use jackc::cli::common::{
    collect_source_files, default_output_path, file_stem, read_source_or_exit, write_output_or_exit,
};
use jackc::diagnostic::print_diagnostics;
use jackc::vmtranslate::VmTranslator;

/// Translates a .vm file or directory of VM files down to Hack assembly.
#[derive(Parser)]
#[command(name = "vmtranslate", version, about = "VM -> Hack assembly translator")]
struct Cli {
    /// Input .vm file or directory of VM files
    input: PathBuf,
    /// Output .asm file (default: <input>.asm, or <dir>/<dir>.asm for a directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let files = collect_source_files(&cli.input, "vm");

    let mut translator = VmTranslator::new();
    // Directory input is a whole-program build regardless of how many
    // .vm files it happens to contain; bootstrap per spec.md §4.4.
    if cli.input.is_dir() {
        translator.bootstrap();
    }
    for file in &files {
        let source = read_source_or_exit(file);
        translator.set_static_prefix(&file_stem(file));
        for (i, line) in source.lines().enumerate() {
            translator.translate_line(i as u32, line);
        }
    }

    let asm = match translator.finish() {
        Ok(lines) => lines,
        Err(diags) => {
            print_diagnostics(&diags);
            process::exit(1);
        }
    };

    let out_path = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.input, "asm"));
    let mut contents = asm.join("\n");
    contents.push('\n');
    write_output_or_exit(&out_path, &contents);
    eprintln!("Translated -> {}", out_path.display());
}
