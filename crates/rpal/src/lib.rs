//! Umbrella crate for the RPAL interpreter.
//!
//! Re-exports the pipeline stages and provides whole-pipeline entry points:
//! source text → tokens → AST → Standardized Tree → result.

pub use rpal_ast as ast;
pub use rpal_cse as cse;
pub use rpal_lexer as lexer;
pub use rpal_parser as parser;
pub use rpal_standardizer as standardizer;

use rpal_ast::Node;
use rpal_cse::{CseMachine, EvalError};
use rpal_lexer::LexError;
use rpal_parser::SyntaxError;

/// Any stage's failure, with a uniform `Display`.
#[derive(Debug)]
pub enum PipelineError {
    Lex(Vec<LexError>),
    Syntax(SyntaxError),
    Eval(EvalError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Lex(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                write!(f, "{}", joined)
            }
            PipelineError::Syntax(e) => write!(f, "{}", e),
            PipelineError::Eval(e) => write!(f, "{}", e),
        }
    }
}

impl From<Vec<LexError>> for PipelineError {
    fn from(errors: Vec<LexError>) -> Self {
        PipelineError::Lex(errors)
    }
}

impl From<SyntaxError> for PipelineError {
    fn from(error: SyntaxError) -> Self {
        PipelineError::Syntax(error)
    }
}

impl From<EvalError> for PipelineError {
    fn from(error: EvalError) -> Self {
        PipelineError::Eval(error)
    }
}

/// Lex and parse `source` into an AST.
pub fn parse(source: &str) -> Result<Node, PipelineError> {
    let tokens = rpal_lexer::lex(source)?;
    Ok(rpal_parser::parse(tokens)?)
}

/// The AST in dot-notation pre-order form.
pub fn ast_dump(source: &str) -> Result<String, PipelineError> {
    Ok(parse(source)?.to_text())
}

/// The Standardized Tree in dot-notation pre-order form.
pub fn st_dump(source: &str) -> Result<String, PipelineError> {
    let ast = parse(source)?;
    Ok(rpal_standardizer::standardize(ast).tree.to_text())
}

/// Run the whole pipeline; `Print` output goes to stdout. Returns the
/// result value in its canonical printed form.
pub fn interpret(source: &str) -> Result<String, PipelineError> {
    let ast = parse(source)?;
    let st = rpal_standardizer::standardize(ast).tree;
    let mut machine = CseMachine::new(&st)?;
    let result = machine.evaluate()?;
    Ok(result.to_string())
}

/// Run the whole pipeline with `Print` output captured. Returns
/// `(result, printed)`.
pub fn interpret_captured(source: &str) -> Result<(String, String), PipelineError> {
    let ast = parse(source)?;
    let st = rpal_standardizer::standardize(ast).tree;
    let mut machine = CseMachine::with_output(&st, Vec::new())?;
    let result = machine.evaluate()?;
    let printed = String::from_utf8(machine.into_output()).unwrap_or_default();
    Ok((result.to_string(), printed))
}
