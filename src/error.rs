//! Compiler-wide error type.
//!
//! The front end speaks four error kinds (lex, syntax, semantic, I/O); this
//! module unifies them into one enum so `?` works end to end, from the
//! lexer up through the CLI.

use std::fmt;

/// An error raised anywhere in the pipeline, from scanning through emission.
#[derive(Debug)]
pub enum CompileError {
    /// Unknown character or unterminated operator lexeme.
    Lex { message: String, line: u32 },
    /// Unexpected token family or lexeme while parsing.
    Syntax { message: String, line: u32 },
    /// Duplicate declaration inside one scope, or another static-semantics
    /// violation that isn't a parse failure.
    Semantic { message: String },
    /// Source unreadable or output path unwritable.
    Io(std::io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex { message, line } => {
                write!(f, "lex error at line {line}: {message}")
            }
            CompileError::Syntax { message, line } => {
                write!(f, "syntax error at line {line}: {message}")
            }
            CompileError::Semantic { message } => write!(f, "semantic error: {message}"),
            CompileError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_line_for_lex_and_syntax_errors() {
        let e = CompileError::Lex {
            message: "unknown character '$'".into(),
            line: 7,
        };
        assert_eq!(e.to_string(), "lex error at line 7: unknown character '$'");

        let e = CompileError::Syntax {
            message: "expected ';'".into(),
            line: 3,
        };
        assert_eq!(e.to_string(), "syntax error at line 3: expected ';'");
    }

    #[test]
    fn displays_without_line_for_semantic_and_io_errors() {
        let e = CompileError::Semantic {
            message: "duplicate declaration: a".into(),
        };
        assert_eq!(e.to_string(), "semantic error: duplicate declaration: a");
    }

    #[test]
    fn wraps_io_error_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: CompileError = io_err.into();
        assert!(matches!(e, CompileError::Io(_)));
    }
}
