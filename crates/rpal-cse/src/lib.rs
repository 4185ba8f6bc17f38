pub mod builtins;
pub mod control;
pub mod error;
pub mod machine;
pub mod value;

pub use error::EvalError;
pub use machine::CseMachine;
pub use value::Value;

use rpal_ast::Node;

/// Evaluate a standardized tree, printing to stdout.
pub fn evaluate(st: &Node) -> Result<Value, EvalError> {
    CseMachine::new(st)?.evaluate()
}
