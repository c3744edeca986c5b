pub mod asm;
pub mod ast;
pub mod cli;
pub mod codegen;
pub mod diagnostic;
pub mod parser;
pub mod span;
pub mod symtable;
pub mod token;
pub mod tokenizer;
pub mod vm;
pub mod vmtranslate;

use diagnostic::Diagnostic;
use parser::Parser;
use tokenizer::Tokenizer;

/// Tokenizes, parses, and generates VM code for one Jack class, in that
/// order — any stage's diagnostics are fatal to the ones after it.
pub fn compile_class(source: &str) -> Result<Vec<String>, Vec<Diagnostic>> {
    let (tokens, lex_diags) = Tokenizer::new(source.lines().map(str::to_string)).tokenize();
    if !lex_diags.is_empty() {
        return Err(lex_diags);
    }
    let class = Parser::new(tokens).parse_class()?;
    codegen::CodeGenerator::new().generate(&class)
}

/// Translates one file's worth of VM source into Hack assembly lines.
/// `static_prefix` names the file's `static` segment variables (normally
/// the file's stem).
pub fn translate_vm(source: &str, static_prefix: &str) -> Result<Vec<String>, Vec<Diagnostic>> {
    let mut translator = vmtranslate::VmTranslator::new();
    translator.set_static_prefix(static_prefix);
    for (i, line) in source.lines().enumerate() {
        translator.translate_line(i as u32, line);
    }
    translator.finish()
}

/// Translates several VM files as one unit, each keeping its own static
/// prefix, prepending the bootstrap sequence (spec.md §4.4).
pub fn translate_vm_directory<'a>(
    files: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Vec<String>, Vec<Diagnostic>> {
    let mut translator = vmtranslate::VmTranslator::new();
    translator.bootstrap();
    for (stem, source) in files {
        translator.set_static_prefix(stem);
        for (i, line) in source.lines().enumerate() {
            translator.translate_line(i as u32, line);
        }
    }
    translator.finish()
}

/// Assembles Hack assembly source into 16-bit binary words.
pub fn assemble(source: &str) -> Result<Vec<String>, Vec<Diagnostic>> {
    let lines = source.lines().enumerate().map(|(i, l)| (i as u32, l));
    asm::Assembler::new().assemble(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_class_tokenize_error_is_fatal_before_parsing() {
        let result = compile_class("class Main {\n  let x @ = 1;\n}\n");
        assert!(result.is_err());
    }

    #[test]
    fn pipeline_end_to_end_for_a_trivial_class() {
        let vm = compile_class(
            "class Main {\n  function void main() {\n    do Output.printInt(1);\n    return;\n  }\n}\n",
        )
        .unwrap();
        let joined = vm.join("\n");
        let asm = translate_vm(&joined, "Main").unwrap();
        let binary = assemble(&asm.join("\n")).unwrap();
        assert!(binary.iter().all(|w| w.len() == 16));
    }
}
