use std::path::PathBuf;
use std::process;

use clap::Parser;

use jackc::cli::common::{collect_source_files, default_output_path, read_source_or_exit, write_output_or_exit};
use jackc::diagnostic::print_diagnostics;

/// Compiles a .jack file or directory of classes down to VM code.
#[derive(Parser)]
#[command(name = "jackc", version, about = "Jack -> VM compiler")]
struct Cli {
    /// Input .jack file or directory of classes
    input: PathBuf,
    /// Output .vm file — concatenates every class into one file. Without
    /// this, directory input writes one <Class>.vm per source file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn write_vm(path: &PathBuf, lines: &[String]) {
    let mut contents = lines.join("\n");
    contents.push('\n');
    write_output_or_exit(path, &contents);
    eprintln!("Compiled -> {}", path.display());
}

fn main() {
    let cli = Cli::parse();
    let files = collect_source_files(&cli.input, "jack");

    let mut compiled = Vec::new();
    for file in &files {
        let source = read_source_or_exit(file);
        match jackc::compile_class(&source) {
            Ok(lines) => compiled.push((file.clone(), lines)),
            Err(diags) => {
                print_diagnostics(&diags);
                process::exit(1);
            }
        }
    }

    match cli.output {
        // `-o` names a file: concatenate every class, as when compiling to
        // a single translation unit.
        Some(out_path) => {
            let vm: Vec<String> = compiled.into_iter().flat_map(|(_, lines)| lines).collect();
            write_vm(&out_path, &vm);
        }
        // Directory input with no `-o`: one <Class>.vm per source file,
        // next to it, so each class keeps its own static segment (spec.md
        // §4.4 namespaces `static` symbols per file).
        None if cli.input.is_dir() => {
            for (file, lines) in &compiled {
                write_vm(&file.with_extension("vm"), lines);
            }
        }
        None => {
            let out_path = default_output_path(&cli.input, "vm");
            write_vm(&out_path, &compiled[0].1);
        }
    }
}
