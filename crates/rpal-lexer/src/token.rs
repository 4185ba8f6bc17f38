use logos::Logos;

#[derive(Default, Debug, Clone)]
pub struct LexerExtras {
    /// Current line (1-based).
    pub line: usize,
    /// Byte offset of the first character of the current line.
    pub line_start: usize,
}

fn newline_callback(lex: &mut logos::Lexer<Token>) {
    lex.extras.line += 1;
    lex.extras.line_start = lex.span().end;
}

#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[logos(extras = LexerExtras)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(error = String)]
pub enum Token {
    // ── Newlines & comments (tracked for line counting, not emitted) ──
    #[regex(r"\n", newline_callback)]
    Newline,

    #[regex(r"//[^\n]*\n", newline_callback, allow_greedy = true)]
    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    // ── Keywords ──────────────────────────────────────────────
    #[token("let")]
    Let,
    #[token("in")]
    In,
    #[token("fn")]
    Fn,
    #[token("where")]
    Where,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,
    #[token("dummy")]
    Dummy,
    #[token("within")]
    Within,
    #[token("rec")]
    Rec,

    // ── Keyword operators ─────────────────────────────────────
    #[token("aug")]
    Aug,
    #[token("or")]
    Or,
    #[token("and")]
    And,
    #[token("not")]
    Not,
    #[token("gr")]
    Gr,
    #[token("ge")]
    Ge,
    #[token("ls")]
    Ls,
    #[token("le")]
    Le,
    #[token("eq")]
    Eq,
    #[token("ne")]
    Ne,

    // ── Punctuation ───────────────────────────────────────────
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("|")]
    Bar,
    #[token("@")]
    At,

    // ── Operators (multi-char) ────────────────────────────────
    #[token("**")]
    Power,
    #[token("->")]
    Arrow,
    #[token(">=")]
    GreaterEqual,
    #[token("<=")]
    LessEqual,

    // ── Operators (single-char) ───────────────────────────────
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Equals,
    #[token(">")]
    Greater,
    #[token("<")]
    Less,
    #[token("&")]
    Ampersand,

    // ── Literals ──────────────────────────────────────────────
    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r#""[^"\n]*""#)]
    #[regex(r"'[^'\n]*'")]
    Str,

    // ── Identifier ────────────────────────────────────────────
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Identifier,
}

impl Token {
    /// Returns true for tokens that are only used for line tracking
    /// and should not be emitted to the parser.
    pub fn is_hidden(&self) -> bool {
        matches!(self, Token::Newline | Token::LineComment)
    }
}
