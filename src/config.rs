//! Compiler configuration.
//!
//! `CompilerConfig` controls which artifacts `compile_source`/`compile_file`
//! write and whether the quad listing is echoed to stdout. Builder methods
//! mirror the rest of the pipeline's style: small, chainable, `Self`-returning.

use std::path::PathBuf;

/// Output and diagnostic knobs for a single compilation.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Write the `.int` quad listing next to the source (or into `out_dir`).
    pub emit_int: bool,
    /// Write the `.asm` RISC-V listing next to the source (or into `out_dir`).
    pub emit_asm: bool,
    /// Directory to write output files into. `None` means alongside the
    /// source file.
    pub out_dir: Option<PathBuf>,
    /// Print the quad listing to stdout as it's produced.
    pub print_quads: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            // The `.int` file is an intermediate artifact; like a compiler's
            // temporary object files, it's only kept around on request
            // (`--keep-int`). `.asm` is always the point of compiling.
            emit_int: false,
            emit_asm: true,
            out_dir: None,
            print_quads: false,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emit_int(mut self, emit_int: bool) -> Self {
        self.emit_int = emit_int;
        self
    }

    pub fn with_emit_asm(mut self, emit_asm: bool) -> Self {
        self.emit_asm = emit_asm;
        self
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    pub fn with_print_quads(mut self, print_quads: bool) -> Self {
        self.print_quads = print_quads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_emits_only_asm_and_stays_quiet() {
        let config = CompilerConfig::default();
        assert!(!config.emit_int);
        assert!(config.emit_asm);
        assert!(config.out_dir.is_none());
        assert!(!config.print_quads);
    }

    #[test]
    fn builder_methods_chain_and_override_defaults() {
        let config = CompilerConfig::new()
            .with_emit_int(true)
            .with_out_dir("build")
            .with_print_quads(true);
        assert!(config.emit_int);
        assert!(config.emit_asm);
        assert_eq!(config.out_dir, Some(PathBuf::from("build")));
        assert!(config.print_quads);
    }
}
