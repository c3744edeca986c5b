use std::path::{Path, PathBuf};
use std::process;

/// Resolves a CLI input argument (file or directory) to the list of
/// source files to process, in stable (sorted) order, as required by the
/// CLI surface contract (spec.md §6). Directory input is not recursive —
/// nand2tetris projects keep every source file at the top level.
pub fn collect_source_files(input: &Path, ext: &str) -> Vec<PathBuf> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = match std::fs::read_dir(input) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|e| e == ext))
                .collect(),
            Err(e) => exit_with_error(&format!("cannot read '{}': {}", input.display(), e)),
        };
        files.sort();
        if files.is_empty() {
            exit_with_error(&format!(
                "no .{} files found in '{}'",
                ext,
                input.display()
            ));
        }
        files
    } else if input.extension().is_some_and(|e| e == ext) {
        vec![input.to_path_buf()]
    } else {
        exit_with_error(&format!(
            "input must be a .{} file or a directory containing .{} files",
            ext, ext
        ))
    }
}

/// Derives the default output path: a single input file swaps its
/// extension; a directory takes its own name as the stem.
pub fn default_output_path(input: &Path, out_ext: &str) -> PathBuf {
    if input.is_dir() {
        let stem = input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "out".to_string());
        input.join(format!("{}.{}", stem, out_ext))
    } else {
        input.with_extension(out_ext)
    }
}

/// The stem used to namespace `static` segment symbols and error
/// messages — the file name without its extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Main".to_string())
}

pub fn read_source_or_exit(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("cannot read '{}': {}", path.display(), e)))
}

pub fn write_output_or_exit(path: &Path, contents: &str) {
    if let Err(e) = std::fs::write(path, contents) {
        exit_with_error(&format!("cannot write '{}': {}", path.display(), e));
    }
}

pub fn exit_with_error(msg: &str) -> ! {
    eprintln!("error: {}", msg);
    process::exit(1);
}
