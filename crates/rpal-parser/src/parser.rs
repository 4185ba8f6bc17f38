//! Recursive-descent parser for RPAL.
//!
//! One method per grammar nonterminal, each returning the subtree it
//! recognized. Left-recursive productions from the reference grammar are
//! rewritten as iteration; `**` and `->` keep their right associativity by
//! direct recursion.

use rpal_ast::{Node, NodeValue};
use rpal_lexer::{SpannedToken, token::Token};

use crate::error::SyntaxError;

pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Parse the token stream into an AST. The whole stream must be
    /// consumed; a trailing token is a syntax error.
    pub fn parse(mut self) -> Result<Node, SyntaxError> {
        let tree = self.e()?;
        if let Some(tok) = self.peek() {
            return Err(SyntaxError::new(
                format!("unexpected token '{}' after expression", tok.text),
                tok.line,
                tok.column,
            ));
        }
        Ok(tree)
    }

    // ─── Token-stream helpers ────────────────────────────────

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<Token> {
        self.peek().map(|t| t.token)
    }

    /// One token of lookahead past the current one (used by `Db`).
    fn peek2_kind(&self) -> Option<Token> {
        self.tokens.get(self.pos + 1).map(|t| t.token)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: Token, what: &str) -> Result<SpannedToken, SyntaxError> {
        match self.peek() {
            Some(tok) if tok.token == kind => Ok(self.advance().unwrap()),
            Some(tok) => Err(SyntaxError::new(
                format!("expected {} but got '{}'", what, tok.text),
                tok.line,
                tok.column,
            )),
            None => Err(self.eof_error(what)),
        }
    }

    /// Position of the last token, for errors at end of input.
    fn eof_error(&self, expected: &str) -> SyntaxError {
        let (line, column) = self
            .tokens
            .last()
            .map(|t| (t.line, t.column))
            .unwrap_or((1, 1));
        SyntaxError::new(
            format!("expected {} but reached end of input", expected),
            line,
            column,
        )
    }

    fn unexpected(&self, context: &str) -> SyntaxError {
        match self.peek() {
            Some(tok) => SyntaxError::new(
                format!("unexpected token '{}' in {}", tok.text, context),
                tok.line,
                tok.column,
            ),
            None => self.eof_error(context),
        }
    }

    fn id_leaf(tok: &SpannedToken) -> Node {
        Node::leaf(NodeValue::Id(tok.text.clone()))
    }

    // ─── Expressions ─────────────────────────────────────────

    // E -> 'let' D 'in' E          => let
    // E -> 'fn' Vb+ '.' E          => lambda
    // E -> Ew
    fn e(&mut self) -> Result<Node, SyntaxError> {
        match self.peek_kind() {
            Some(Token::Let) => {
                self.advance();
                let defs = self.d()?;
                self.expect(Token::In, "'in'")?;
                let body = self.e()?;
                Ok(Node::internal(NodeValue::Let, vec![defs, body]))
            }
            Some(Token::Fn) => {
                self.advance();
                let mut kids = vec![self.vb()?];
                while self.peek_kind().is_some_and(|k| k != Token::Dot) {
                    kids.push(self.vb()?);
                }
                self.expect(Token::Dot, "'.' after function parameters")?;
                kids.push(self.e()?);
                Ok(Node::internal(NodeValue::Lambda, kids))
            }
            _ => self.ew(),
        }
    }

    // Ew -> T 'where' Dr           => where
    // Ew -> T
    fn ew(&mut self) -> Result<Node, SyntaxError> {
        let tree = self.t()?;
        if self.peek_kind() == Some(Token::Where) {
            self.advance();
            let defs = self.dr()?;
            return Ok(Node::internal(NodeValue::Where, vec![tree, defs]));
        }
        Ok(tree)
    }

    // ─── Tuple expressions ───────────────────────────────────

    // T -> Ta (',' Ta)+            => tau
    // T -> Ta
    fn t(&mut self) -> Result<Node, SyntaxError> {
        let first = self.ta()?;
        if self.peek_kind() != Some(Token::Comma) {
            return Ok(first);
        }
        let mut kids = vec![first];
        while self.peek_kind() == Some(Token::Comma) {
            self.advance();
            kids.push(self.ta()?);
        }
        Ok(Node::internal(NodeValue::Tau, kids))
    }

    // Ta -> Ta 'aug' Tc            => aug  (iterated, left-associative)
    // Ta -> Tc
    fn ta(&mut self) -> Result<Node, SyntaxError> {
        let mut tree = self.tc()?;
        while self.peek_kind() == Some(Token::Aug) {
            self.advance();
            let right = self.tc()?;
            tree = Node::internal(NodeValue::Aug, vec![tree, right]);
        }
        Ok(tree)
    }

    // Tc -> B '->' Tc '|' Tc       => ->
    // Tc -> B
    fn tc(&mut self) -> Result<Node, SyntaxError> {
        let cond = self.b()?;
        if self.peek_kind() != Some(Token::Arrow) {
            return Ok(cond);
        }
        self.advance();
        let then_branch = self.tc()?;
        self.expect(Token::Bar, "'|' after '->'")?;
        let else_branch = self.tc()?;
        Ok(Node::internal(
            NodeValue::Arrow,
            vec![cond, then_branch, else_branch],
        ))
    }

    // ─── Boolean expressions ─────────────────────────────────

    // B -> B 'or' Bt               => or  (iterated)
    fn b(&mut self) -> Result<Node, SyntaxError> {
        let mut tree = self.bt()?;
        while self.peek_kind() == Some(Token::Or) {
            self.advance();
            let right = self.bt()?;
            tree = Node::internal(NodeValue::Or, vec![tree, right]);
        }
        Ok(tree)
    }

    // Bt -> Bt '&' Bs              => &  (iterated)
    fn bt(&mut self) -> Result<Node, SyntaxError> {
        let mut tree = self.bs()?;
        while self.peek_kind() == Some(Token::Ampersand) {
            self.advance();
            let right = self.bs()?;
            tree = Node::internal(NodeValue::Amp, vec![tree, right]);
        }
        Ok(tree)
    }

    // Bs -> 'not' Bp               => not
    // Bs -> Bp
    fn bs(&mut self) -> Result<Node, SyntaxError> {
        if self.peek_kind() == Some(Token::Not) {
            self.advance();
            let operand = self.bp()?;
            return Ok(Node::internal(NodeValue::Not, vec![operand]));
        }
        self.bp()
    }

    // Bp -> A ('gr'|'ge'|'ls'|'le'|'eq'|'ne'|'>'|'>='|'<'|'<=') A
    // Bp -> A
    fn bp(&mut self) -> Result<Node, SyntaxError> {
        let left = self.a()?;
        let op = match self.peek_kind() {
            Some(Token::Gr) | Some(Token::Greater) => NodeValue::Gr,
            Some(Token::Ge) | Some(Token::GreaterEqual) => NodeValue::Ge,
            Some(Token::Ls) | Some(Token::Less) => NodeValue::Ls,
            Some(Token::Le) | Some(Token::LessEqual) => NodeValue::Le,
            Some(Token::Eq) => NodeValue::Eq,
            Some(Token::Ne) => NodeValue::Ne,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.a()?;
        Ok(Node::internal(op, vec![left, right]))
    }

    // ─── Arithmetic expressions ──────────────────────────────

    // A -> ['+'|'-'] At (('+'|'-') At)*    leading '-' => neg
    fn a(&mut self) -> Result<Node, SyntaxError> {
        let mut tree = match self.peek_kind() {
            Some(Token::Plus) => {
                self.advance();
                self.at()?
            }
            Some(Token::Minus) => {
                self.advance();
                let operand = self.at()?;
                Node::internal(NodeValue::Neg, vec![operand])
            }
            _ => self.at()?,
        };
        loop {
            let op = match self.peek_kind() {
                Some(Token::Plus) => NodeValue::Plus,
                Some(Token::Minus) => NodeValue::Minus,
                _ => break,
            };
            self.advance();
            let right = self.at()?;
            tree = Node::internal(op, vec![tree, right]);
        }
        Ok(tree)
    }

    // At -> Af (('*'|'/') Af)*
    fn at(&mut self) -> Result<Node, SyntaxError> {
        let mut tree = self.af()?;
        loop {
            let op = match self.peek_kind() {
                Some(Token::Star) => NodeValue::Times,
                Some(Token::Slash) => NodeValue::Divide,
                _ => break,
            };
            self.advance();
            let right = self.af()?;
            tree = Node::internal(op, vec![tree, right]);
        }
        Ok(tree)
    }

    // Af -> Ap '**' Af             => **  (right-associative)
    // Af -> Ap
    fn af(&mut self) -> Result<Node, SyntaxError> {
        let base = self.ap()?;
        if self.peek_kind() != Some(Token::Power) {
            return Ok(base);
        }
        self.advance();
        let exponent = self.af()?;
        Ok(Node::internal(NodeValue::Power, vec![base, exponent]))
    }

    // Ap -> R ('@' IDENTIFIER R)*  => @
    fn ap(&mut self) -> Result<Node, SyntaxError> {
        let mut tree = self.r()?;
        while self.peek_kind() == Some(Token::At) {
            self.advance();
            let name = self.expect(Token::Identifier, "identifier after '@'")?;
            let right = self.r()?;
            tree = Node::internal(NodeValue::At, vec![tree, Self::id_leaf(&name), right]);
        }
        Ok(tree)
    }

    // ─── Rators and rands ────────────────────────────────────

    // R -> Rn Rn*                  => gamma  (iterated, left-associative)
    fn r(&mut self) -> Result<Node, SyntaxError> {
        let mut tree = self.rn()?;
        while self.starts_operand() {
            let operand = self.rn()?;
            tree = Node::internal(NodeValue::Gamma, vec![tree, operand]);
        }
        Ok(tree)
    }

    /// FIRST(Rn): the tokens that can begin an operand.
    fn starts_operand(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                Token::LParen
                    | Token::Identifier
                    | Token::Integer
                    | Token::Str
                    | Token::True
                    | Token::False
                    | Token::Nil
                    | Token::Dummy
            )
        )
    }

    // Rn -> '(' E ')' | IDENTIFIER | INTEGER | STRING
    //     | 'true' | 'false' | 'nil' | 'dummy'
    fn rn(&mut self) -> Result<Node, SyntaxError> {
        let tok = match self.peek() {
            Some(tok) => tok.clone(),
            None => return Err(self.eof_error("an operand")),
        };
        match tok.token {
            Token::LParen => {
                self.advance();
                let tree = self.e()?;
                self.expect(Token::RParen, "')' after expression")?;
                Ok(tree)
            }
            Token::Identifier => {
                self.advance();
                Ok(Self::id_leaf(&tok))
            }
            Token::Integer => {
                self.advance();
                let n: i64 = tok.text.parse().map_err(|_| {
                    SyntaxError::new(
                        format!("integer literal '{}' out of range", tok.text),
                        tok.line,
                        tok.column,
                    )
                })?;
                Ok(Node::leaf(NodeValue::Int(n)))
            }
            Token::Str => {
                self.advance();
                // Strip the surrounding quotes kept by the lexer
                let content = tok.text[1..tok.text.len() - 1].to_string();
                Ok(Node::leaf(NodeValue::Str(content)))
            }
            Token::True => {
                self.advance();
                Ok(Node::leaf(NodeValue::True))
            }
            Token::False => {
                self.advance();
                Ok(Node::leaf(NodeValue::False))
            }
            Token::Nil => {
                self.advance();
                Ok(Node::leaf(NodeValue::Nil))
            }
            Token::Dummy => {
                self.advance();
                Ok(Node::leaf(NodeValue::Dummy))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    // ─── Definitions ─────────────────────────────────────────

    // D -> Da 'within' D           => within
    // D -> Da
    fn d(&mut self) -> Result<Node, SyntaxError> {
        let first = self.da()?;
        if self.peek_kind() == Some(Token::Within) {
            self.advance();
            let rest = self.d()?;
            return Ok(Node::internal(NodeValue::Within, vec![first, rest]));
        }
        Ok(first)
    }

    // Da -> Dr ('and' Dr)+         => and
    // Da -> Dr
    fn da(&mut self) -> Result<Node, SyntaxError> {
        let first = self.dr()?;
        if self.peek_kind() != Some(Token::And) {
            return Ok(first);
        }
        let mut kids = vec![first];
        while self.peek_kind() == Some(Token::And) {
            self.advance();
            kids.push(self.dr()?);
        }
        Ok(Node::internal(NodeValue::And, kids))
    }

    // Dr -> 'rec' Db               => rec
    // Dr -> Db
    fn dr(&mut self) -> Result<Node, SyntaxError> {
        if self.peek_kind() == Some(Token::Rec) {
            self.advance();
            let def = self.db()?;
            return Ok(Node::internal(NodeValue::Rec, vec![def]));
        }
        self.db()
    }

    // Db -> IDENTIFIER Vb+ '=' E   => function_form
    // Db -> Vl '=' E               => =
    // Db -> '(' D ')'
    fn db(&mut self) -> Result<Node, SyntaxError> {
        match self.peek_kind() {
            Some(Token::Identifier) => {
                // A parameter after the name means a function form;
                // otherwise this is a plain (possibly comma-list) binding.
                if matches!(
                    self.peek2_kind(),
                    Some(Token::Identifier) | Some(Token::LParen)
                ) {
                    let name = self.advance().unwrap();
                    let mut kids = vec![Self::id_leaf(&name), self.vb()?];
                    while self.peek_kind().is_some_and(|k| k != Token::Equals) {
                        kids.push(self.vb()?);
                    }
                    self.expect(Token::Equals, "'=' after function parameters")?;
                    kids.push(self.e()?);
                    Ok(Node::internal(NodeValue::FunctionForm, kids))
                } else {
                    let names = self.vl()?;
                    self.expect(Token::Equals, "'=' in definition")?;
                    let value = self.e()?;
                    Ok(Node::internal(NodeValue::Equal, vec![names, value]))
                }
            }
            Some(Token::LParen) => {
                self.advance();
                let def = self.d()?;
                self.expect(Token::RParen, "')' after definition")?;
                Ok(def)
            }
            _ => Err(self.unexpected("definition")),
        }
    }

    // ─── Variables ───────────────────────────────────────────

    // Vb -> IDENTIFIER | '(' ')'   => () | '(' Vl ')'
    fn vb(&mut self) -> Result<Node, SyntaxError> {
        match self.peek_kind() {
            Some(Token::Identifier) => {
                let tok = self.advance().unwrap();
                Ok(Self::id_leaf(&tok))
            }
            Some(Token::LParen) => {
                self.advance();
                if self.peek_kind() == Some(Token::RParen) {
                    self.advance();
                    return Ok(Node::leaf(NodeValue::Empty));
                }
                let list = self.vl()?;
                self.expect(Token::RParen, "')' after variable list")?;
                Ok(list)
            }
            _ => Err(self.unexpected("variable binding")),
        }
    }

    // Vl -> IDENTIFIER (',' IDENTIFIER)*   => , when more than one
    fn vl(&mut self) -> Result<Node, SyntaxError> {
        let first = self.expect(Token::Identifier, "identifier")?;
        if self.peek_kind() != Some(Token::Comma) {
            return Ok(Self::id_leaf(&first));
        }
        let mut kids = vec![Self::id_leaf(&first)];
        while self.peek_kind() == Some(Token::Comma) {
            self.advance();
            let name = self.expect(Token::Identifier, "identifier after ','")?;
            kids.push(Self::id_leaf(&name));
        }
        Ok(Node::internal(NodeValue::Comma, kids))
    }
}
