//! Single-pass compiler for the Cimple teaching language.
//!
//! The pipeline is: lex -> parse+translate into quads -> render `.int` text
//! and `.asm` text. There is no separate AST or IR pass; `parser` drives
//! quad emission directly as it recognizes the grammar.

pub mod asm;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod quad;
pub mod quadwriter;
pub mod symtab;

use std::fs;
use std::path::{Path, PathBuf};

pub use config::CompilerConfig;
pub use error::{CompileError, CompileResult};

use parser::Parser;

/// The text artifacts produced by compiling one source string.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub int_text: String,
    pub asm_text: String,
    pub quad_count: usize,
}

/// Runs the full pipeline over `source` and returns the rendered artifacts.
/// Does not touch the filesystem; see `compile_file` for that.
pub fn compile_source(source: &str) -> CompileResult<CompiledProgram> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()?;

    debug_assert!(
        parser.quads.fully_backpatched(),
        "parser produced a quad stream with an unresolved jump target"
    );

    let int_text = quadwriter::render(parser.quads.quads());
    let asm_text = asm::emit(parser.quads.quads(), &parser.symtab, &parser.program_name);

    Ok(CompiledProgram {
        int_text,
        asm_text,
        quad_count: parser.quads.quads().len(),
    })
}

/// Compiles the file at `source_path` with default settings: both `.int`
/// and `.asm` are written alongside the source, quads are not echoed.
pub fn compile_file(source_path: &Path) -> Result<(), String> {
    compile_file_with_config(source_path, &CompilerConfig::default())
}

/// Compiles the file at `source_path` according to `config`.
pub fn compile_file_with_config(source_path: &Path, config: &CompilerConfig) -> Result<(), String> {
    let source = fs::read_to_string(source_path)
        .map_err(|e| format!("failed to read '{}': {e}", source_path.display()))?;

    let compiled = compile_source(&source).map_err(|e| e.to_string())?;

    if config.print_quads {
        print!("{}", compiled.int_text);
    }

    let stem = source_path
        .file_stem()
        .ok_or_else(|| format!("'{}' has no file name", source_path.display()))?;

    let base_dir = config.out_dir.clone().unwrap_or_else(|| {
        source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    if let Some(dir) = &config.out_dir {
        fs::create_dir_all(dir).map_err(|e| format!("failed to create '{}': {e}", dir.display()))?;
    }

    if config.emit_int {
        let int_path = base_dir.join(stem).with_extension("int");
        fs::write(&int_path, &compiled.int_text)
            .map_err(|e| format!("failed to write '{}': {e}", int_path.display()))?;
    }

    if config.emit_asm {
        let asm_path = base_dir.join(stem).with_extension("asm");
        fs::write(&asm_path, &compiled.asm_text)
            .map_err(|e| format!("failed to write '{}': {e}", asm_path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_source_rejects_a_missing_trailing_period() {
        let err = compile_source("program P declare a; { a := 1 }").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn compile_source_produces_matching_int_and_asm_text() {
        let compiled = compile_source("program P declare a; { a := 1 + 2 }.").unwrap();
        assert!(compiled.int_text.contains("begin_block, P"));
        assert!(compiled.asm_text.contains("Lmain"));
        assert_eq!(compiled.quad_count, compiled.int_text.lines().count());
    }

    #[test]
    fn compile_file_writes_only_asm_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("p.ci");
        fs::write(&src_path, "program P declare a; { a := 1 }.").unwrap();

        compile_file(&src_path).unwrap();

        assert!(!dir.path().join("p.int").exists());
        assert!(dir.path().join("p.asm").exists());
    }

    #[test]
    fn out_dir_redirects_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("p.ci");
        fs::write(&src_path, "program P declare a; { a := 1 }.").unwrap();
        let out_dir = dir.path().join("build");

        let config = CompilerConfig::new().with_emit_int(true).with_out_dir(&out_dir);
        compile_file_with_config(&src_path, &config).unwrap();

        assert!(out_dir.join("p.int").exists());
        assert!(out_dir.join("p.asm").exists());
        assert!(!dir.path().join("p.int").exists());
    }

    #[test]
    fn keep_int_flag_writes_the_intermediate_file_too() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("p.ci");
        fs::write(&src_path, "program P declare a; { a := 1 }.").unwrap();

        let config = CompilerConfig::new().with_emit_int(true);
        compile_file_with_config(&src_path, &config).unwrap();

        assert!(dir.path().join("p.int").exists());
        assert!(dir.path().join("p.asm").exists());
    }
}
