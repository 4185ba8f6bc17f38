pub mod token;

use logos::Logos;
use token::{LexerExtras, Token};

/// A token paired with its source text and position.
///
/// String tokens keep their surrounding quotes in `text`; downstream
/// stages strip them when they need the payload.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Lex the input source, returning all meaningful tokens with positions.
///
/// Hidden tokens (newlines, comments) are consumed for line tracking
/// but not included in the output.
pub fn lex(source: &str) -> Result<Vec<SpannedToken>, Vec<LexError>> {
    let mut lexer = Token::lexer_with_extras(
        source,
        LexerExtras {
            line: 1,
            line_start: 0,
        },
    );
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while let Some(result) = lexer.next() {
        let line = lexer.extras.line;
        let column = lexer.span().start - lexer.extras.line_start + 1;
        let text = lexer.slice().to_string();

        match result {
            Ok(tok) if tok.is_hidden() => continue,
            Ok(tok) => {
                tokens.push(SpannedToken {
                    token: tok,
                    text,
                    line,
                    column,
                });
            }
            Err(_) => {
                let kind = if text.starts_with('"') || text.starts_with('\'') {
                    LexErrorKind::UnterminatedString
                } else {
                    LexErrorKind::UnexpectedCharacter
                };
                errors.push(LexError {
                    kind,
                    text,
                    line,
                    column,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// What went wrong while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    UnexpectedCharacter,
    UnterminatedString,
}

/// A lexical error with location info.
#[derive(Debug, Clone)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            LexErrorKind::UnexpectedCharacter => write!(
                f,
                "line {} column {}: unrecognized character: {:?}",
                self.line, self.column, self.text
            ),
            LexErrorKind::UnterminatedString => write!(
                f,
                "line {} column {}: unterminated string literal",
                self.line, self.column
            ),
        }
    }
}
