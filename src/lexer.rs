//! Hand-rolled FSM lexer for Cimple source text.
//!
//! A thin, self-contained scanning pass: it knows nothing about the
//! grammar, only about characters. The parser consumes its output once,
//! front to back.

use crate::error::CompileError;

const KEYWORDS: &[&str] = &[
    "program",
    "declare",
    "if",
    "else",
    "while",
    "switchcase",
    "forcase",
    "incase",
    "case",
    "default",
    "not",
    "and",
    "or",
    "function",
    "procedure",
    "call",
    "return",
    "in",
    "inout",
    "input",
    "print",
];

const OPERATORS: &[&str] = &["+", "-", "*", "/", "=", "<=", ">=", ">", "<", "<>", ":="];
const SYMBOLS: &[char] = &[';', ',', ':', '(', ')', '{', '}', '[', ']', '.'];

/// The lexical class a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFamily {
    Keyword,
    Identifier,
    Number,
    Operator,
    Symbol,
}

/// A single scanned token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub lexeme: String,
    pub family: TokenFamily,
    pub line: u32,
}

impl Token {
    fn new(lexeme: impl Into<String>, family: TokenFamily, line: u32) -> Self {
        Token {
            lexeme: lexeme.into(),
            family,
            line,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Identifier,
    Number,
    Operator,
    Comment,
}

/// Scans an entire source string into a flat token vector.
///
/// The whole input is tokenized up front (rather than lazily) because the
/// parser never needs more than simple one-token lookahead, and a flat
/// `Vec<Token>` makes that lookahead trivial to implement.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut state = State::Start;
    let mut lexeme = String::new();
    let mut line: u32 = 1;
    let mut token_start_line: u32 = 1;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match state {
            State::Start => {
                match c {
                    ' ' | '\t' | '\r' => i += 1,
                    '\n' => {
                        line += 1;
                        i += 1;
                    }
                    '#' => {
                        state = State::Comment;
                        i += 1;
                    }
                    _ if c.is_alphabetic() => {
                        state = State::Identifier;
                        lexeme.push(c);
                        token_start_line = line;
                        i += 1;
                    }
                    _ if c.is_ascii_digit() => {
                        state = State::Number;
                        lexeme.push(c);
                        token_start_line = line;
                        i += 1;
                    }
                    _ if OPERATORS.iter().any(|op| op.starts_with(c)) => {
                        state = State::Operator;
                        lexeme.push(c);
                        token_start_line = line;
                        i += 1;
                    }
                    _ if SYMBOLS.contains(&c) => {
                        tokens.push(Token::new(c.to_string(), TokenFamily::Symbol, line));
                        i += 1;
                    }
                    _ => {
                        return Err(CompileError::Lex {
                            message: format!("unknown character '{c}'"),
                            line,
                        });
                    }
                }
            }
            State::Identifier => {
                if i < chars.len() && (chars[i].is_alphanumeric()) {
                    lexeme.push(chars[i]);
                    i += 1;
                } else {
                    push_identifier(&mut tokens, &mut lexeme, token_start_line);
                    state = State::Start;
                }
            }
            State::Number => {
                if i < chars.len() && chars[i].is_ascii_digit() {
                    lexeme.push(chars[i]);
                    i += 1;
                } else {
                    tokens.push(Token::new(
                        std::mem::take(&mut lexeme),
                        TokenFamily::Number,
                        token_start_line,
                    ));
                    state = State::Start;
                }
            }
            State::Operator => {
                if i < chars.len() {
                    let two_char: String = [lexeme.as_str(), &chars[i].to_string()].concat();
                    if OPERATORS.contains(&two_char.as_str()) {
                        tokens.push(Token::new(two_char, TokenFamily::Operator, token_start_line));
                        lexeme.clear();
                        state = State::Start;
                        i += 1;
                        continue;
                    }
                }
                if OPERATORS.contains(&lexeme.as_str()) {
                    tokens.push(Token::new(
                        std::mem::take(&mut lexeme),
                        TokenFamily::Operator,
                        token_start_line,
                    ));
                    state = State::Start;
                } else {
                    return Err(CompileError::Lex {
                        message: format!("unknown operator '{lexeme}'"),
                        line: token_start_line,
                    });
                }
            }
            State::Comment => {
                if c == '#' {
                    state = State::Start;
                }
                if c == '\n' {
                    line += 1;
                }
                i += 1;
            }
        }
    }

    match state {
        State::Identifier => push_identifier(&mut tokens, &mut lexeme, token_start_line),
        State::Number => tokens.push(Token::new(lexeme, TokenFamily::Number, token_start_line)),
        State::Operator => {
            if OPERATORS.contains(&lexeme.as_str()) {
                tokens.push(Token::new(lexeme, TokenFamily::Operator, token_start_line));
            } else {
                return Err(CompileError::Lex {
                    message: format!("unknown operator '{lexeme}'"),
                    line: token_start_line,
                });
            }
        }
        State::Comment => {
            return Err(CompileError::Lex {
                message: "unterminated comment".to_string(),
                line: token_start_line,
            });
        }
        State::Start => {}
    }

    Ok(tokens)
}

fn push_identifier(tokens: &mut Vec<Token>, lexeme: &mut String, line: u32) {
    let family = if KEYWORDS.contains(&lexeme.as_str()) {
        TokenFamily::Keyword
    } else {
        TokenFamily::Identifier
    };
    tokens.push(Token::new(std::mem::take(lexeme), family, line));
}
