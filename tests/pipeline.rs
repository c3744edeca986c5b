//! End-to-end coverage of the full Jack -> VM -> Hack assembly -> binary
//! pipeline, driven through a directory of classes on disk the way the
//! three CLI binaries would see it.

use std::path::Path;

fn write_class(dir: &Path, name: &str, source: &str) {
    std::fs::write(dir.join(format!("{}.jack", name)), source).unwrap();
}

#[test]
fn multi_class_program_compiles_translates_and_assembles() {
    let dir = tempfile::tempdir().unwrap();

    write_class(
        dir.path(),
        "Main",
        r#"
class Main {
    function void main() {
        var Point p;
        let p = Point.new(3, 4);
        do p.sum();
        return;
    }
}
"#,
    );
    write_class(
        dir.path(),
        "Point",
        r#"
class Point {
    field int x, y;

    constructor Point new(int ax, int ay) {
        let x = ax;
        let y = ay;
        return this;
    }

    method int sum() {
        return x + y;
    }
}
"#,
    );

    let mut vm_sources = Vec::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    entries.sort();

    let mut vm = Vec::new();
    for entry in &entries {
        let source = std::fs::read_to_string(entry).unwrap();
        let lines = jackc::compile_class(&source).unwrap_or_else(|errs| {
            panic!("{} should compile, got {:?}", entry.display(), errs);
        });
        vm_sources.push((entry.file_stem().unwrap().to_string_lossy().to_string(), lines));
        vm.extend(vm_sources.last().unwrap().1.clone());
    }

    assert!(vm.iter().any(|l| l == "function Main.main 1"));
    assert!(vm.iter().any(|l| l == "function Point.new 0"));
    assert!(vm.iter().any(|l| l == "call Point.new 2"));
    assert!(vm.iter().any(|l| l == "call Point.sum 1"));

    let joined: Vec<(String, String)> = vm_sources
        .iter()
        .map(|(stem, lines)| (stem.clone(), lines.join("\n")))
        .collect();

    let asm = jackc::translate_vm_directory(joined.iter().map(|(s, l)| (s.as_str(), l.as_str())))
        .expect("translation should succeed");

    assert_eq!(&asm[..2], &["@256", "D=A"]);
    assert!(asm.iter().any(|l| l == "@Sys.init"));
    assert!(asm.iter().any(|l| l == "(Main.main)"));

    let binary = jackc::assemble(&asm.join("\n")).expect("assembly should succeed");
    assert_eq!(binary.len(), asm.iter().filter(|l| !is_label(l)).count());
    for word in &binary {
        assert_eq!(word.len(), 16);
        assert!(word.chars().all(|c| c == '0' || c == '1'));
    }
}

fn is_label(line: &str) -> bool {
    line.starts_with('(')
}

#[test]
fn tokenize_error_surfaces_as_single_line_diagnostic() {
    let result = jackc::compile_class("class Main {\n  let x @ = 1;\n}\n");
    let diags = result.unwrap_err();
    assert_eq!(diags.len(), 1);
    assert!(diags[0].contract_line().starts_with("1:"));
}

#[test]
fn assembler_round_trips_the_spec_examples() {
    let asm = "@21\nD=A;JGT\n";
    let binary = jackc::assemble(asm).unwrap();
    assert_eq!(binary[0], "0000000000010101");
    assert_eq!(binary[1], "1110110000010001");
}
